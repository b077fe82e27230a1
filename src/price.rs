// 10.0: the price board. one mutable latest row per symbol plus an append-only,
// time-ordered history per symbol with sampling and retention-based pruning.
//
// the latest row is written with last-writer-wins semantics: the simulator is
// deterministic, so concurrent writers always agree on the value and races are
// harmless.

use crate::types::{Price, Symbol, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// From the external quote feed (primary-market symbols).
    Live,
    /// Produced by the deterministic simulator.
    Simulated,
    /// Initial reference price before any tick exists.
    Seed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: Symbol,
    pub price: Price,
    pub as_of: Timestamp,
    pub source: PriceSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Price,
    pub as_of: Timestamp,
}

/// History sampling: at most one point per symbol per window.
pub const HISTORY_SAMPLE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    latest: HashMap<Symbol, PriceTick>,
    history: HashMap<Symbol, Vec<PricePoint>>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, symbol: &Symbol) -> Option<&PriceTick> {
        self.latest.get(symbol)
    }

    /// Upsert the single latest row for a symbol. Last writer wins.
    pub fn upsert_latest(&mut self, tick: PriceTick) {
        self.latest.insert(tick.symbol.clone(), tick);
    }

    /// Latest price with fallback to the most recent history point. Used by
    /// valuation paths that must tolerate a missing latest row.
    pub fn last_known(&self, symbol: &Symbol) -> Option<PricePoint> {
        if let Some(tick) = self.latest.get(symbol) {
            return Some(PricePoint {
                price: tick.price,
                as_of: tick.as_of,
            });
        }
        self.history.get(symbol).and_then(|points| points.last().copied())
    }

    /// Append a history point if the symbol has none inside the sampling
    /// window. Keeps the chart table from saturating.
    pub fn append_history_sampled(&mut self, symbol: &Symbol, price: Price, as_of: Timestamp) {
        let points = self.history.entry(symbol.clone()).or_default();
        if let Some(last) = points.last() {
            if as_of.minute_bucket() - last.as_of.minute_bucket() < HISTORY_SAMPLE_MINUTES {
                return;
            }
        }
        points.push(PricePoint { price, as_of });
    }

    pub fn history(&self, symbol: &Symbol) -> &[PricePoint] {
        self.history.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop history points older than the cutoff. Latest rows are never pruned.
    pub fn prune_history(&mut self, cutoff: Timestamp) -> usize {
        let mut removed = 0;
        for points in self.history.values_mut() {
            let before = points.len();
            points.retain(|p| p.as_of >= cutoff);
            removed += before - points.len();
        }
        self.history.retain(|_, points| !points.is_empty());
        removed
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.latest.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(symbol: &str, price: rust_decimal::Decimal, ms: i64) -> PriceTick {
        PriceTick {
            symbol: Symbol::from(symbol),
            price: Price::new_unchecked(price),
            as_of: Timestamp::from_millis(ms),
            source: PriceSource::Simulated,
        }
    }

    #[test]
    fn latest_is_single_row() {
        let mut board = PriceBoard::new();
        board.upsert_latest(tick("NESN.SW", dec!(90), 0));
        board.upsert_latest(tick("NESN.SW", dec!(91), 60_000));
        assert_eq!(board.latest(&Symbol::from("NESN.SW")).unwrap().price.value(), dec!(91));
    }

    #[test]
    fn history_sampling_window() {
        let mut board = PriceBoard::new();
        let sym = Symbol::from("ROG.SW");
        board.append_history_sampled(&sym, Price::new_unchecked(dec!(250)), Timestamp::from_millis(0));
        // 2 minutes later: inside the window, skipped
        board.append_history_sampled(
            &sym,
            Price::new_unchecked(dec!(251)),
            Timestamp::from_millis(2 * 60_000),
        );
        assert_eq!(board.history(&sym).len(), 1);
        // 5 minutes later: sampled
        board.append_history_sampled(
            &sym,
            Price::new_unchecked(dec!(252)),
            Timestamp::from_millis(5 * 60_000),
        );
        assert_eq!(board.history(&sym).len(), 2);
    }

    #[test]
    fn last_known_falls_back_to_history() {
        let mut board = PriceBoard::new();
        let sym = Symbol::from("OR.PA");
        board.append_history_sampled(&sym, Price::new_unchecked(dec!(400)), Timestamp::from_millis(0));
        let point = board.last_known(&sym).unwrap();
        assert_eq!(point.price.value(), dec!(400));
        assert!(board.latest(&sym).is_none());
    }

    #[test]
    fn prune_drops_old_points() {
        let mut board = PriceBoard::new();
        let sym = Symbol::from("SIE.DE");
        board.append_history_sampled(&sym, Price::new_unchecked(dec!(100)), Timestamp::from_millis(0));
        board.append_history_sampled(
            &sym,
            Price::new_unchecked(dec!(101)),
            Timestamp::from_millis(10 * 60_000),
        );
        let removed = board.prune_history(Timestamp::from_millis(5 * 60_000));
        assert_eq!(removed, 1);
        assert_eq!(board.history(&sym).len(), 1);
    }
}
