// 11.0: live quote feed seam. the engine is agnostic to which vendor supplies
// primary-market quotes; anything that can answer fetch_quote plugs in.
// feed failures are per-symbol and non-fatal: skip and retry next cycle.

use crate::types::{Price, Symbol};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A source of live prices for primary-market (non-simulated) symbols.
/// Rate limiting is the implementor's concern.
pub trait QuoteFeed {
    /// Human readable name.
    fn name(&self) -> &str;

    /// Latest quote, or None on any failure (rate limit, unknown symbol,
    /// transport error). Callers treat None as skip-this-round.
    fn fetch_quote(&self, symbol: &Symbol) -> Option<Price>;

    /// Whether the feed is currently reachable.
    fn is_healthy(&self) -> bool;
}

/// In-memory feed for tests and the demo binary.
pub struct MockQuoteFeed {
    name: String,
    prices: HashMap<Symbol, Price>,
    healthy: bool,
}

impl MockQuoteFeed {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prices: HashMap::new(),
            healthy: true,
        }
    }

    pub fn set_price(&mut self, symbol: Symbol, price: Decimal) {
        if let Some(price) = Price::new(price) {
            self.prices.insert(symbol, price);
        }
    }

    pub fn remove_price(&mut self, symbol: &Symbol) {
        self.prices.remove(symbol);
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl QuoteFeed for MockQuoteFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_quote(&self, symbol: &Symbol) -> Option<Price> {
        if !self.healthy {
            return None;
        }
        self.prices.get(symbol).copied()
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}
