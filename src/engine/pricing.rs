// 12.2 engine/pricing.rs: keeps the price board current. simulated symbols are
// fast-forwarded on demand with the deterministic simulator; live symbols take
// whatever the quote feed last supplied, with a cosmetic oscillation while the
// venue is open.

use super::core::Engine;
use super::results::SweepResult;
use crate::calendar;
use crate::events::{EventPayload, PriceTickEvent};
use crate::price::{PricePoint, PriceSource, PriceTick};
use crate::quotes::QuoteFeed;
use crate::sim;
use crate::types::{Price, Symbol, Timestamp};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

impl Engine {
    /// Write a `Seed` tick for every instrument that has a reference price but
    /// no board row yet. Idempotent; call after registering instruments.
    pub fn seed_reference_prices(&mut self) {
        let now = self.current_time;
        let to_seed: Vec<(Symbol, Price)> = self
            .refdata
            .instruments_iter()
            .filter_map(|i| i.seed_price.map(|p| (i.symbol.clone(), p)))
            .filter(|(symbol, _)| self.prices.last_known(symbol).is_none())
            .collect();

        for (symbol, price) in to_seed {
            self.write_tick(symbol, price, now, PriceSource::Seed);
        }
    }

    /// Fast-forward every simulated instrument to the current time.
    pub fn refresh_simulated_prices(&mut self) {
        let symbols: Vec<Symbol> = self
            .refdata
            .instruments_iter()
            .map(|i| i.symbol.clone())
            .filter(sim::is_simulated)
            .collect();

        for symbol in symbols {
            let _ = self.simulate_forward(&symbol);
        }
    }

    /// Pull quotes for every live (non-simulated) instrument. Per-symbol feed
    /// failures are skipped; the stale board row keeps serving until the next
    /// successful fetch. Returns the number of symbols updated.
    pub fn refresh_live_quotes(&mut self, feed: &dyn QuoteFeed) -> usize {
        let now = self.current_time;
        let symbols: Vec<Symbol> = self
            .refdata
            .instruments_iter()
            .map(|i| i.symbol.clone())
            .filter(|s| !sim::is_simulated(s))
            .collect();

        let mut updated = 0;
        for symbol in symbols {
            if let Some(price) = feed.fetch_quote(&symbol) {
                self.write_tick(symbol, price, now, PriceSource::Live);
                updated += 1;
            }
        }
        updated
    }

    /// One engine heartbeat: bring simulated prices forward, then run the
    /// matching sweep against the fresh board.
    pub fn tick(&mut self) -> SweepResult {
        self.refresh_simulated_prices();
        self.match_open_orders()
    }

    /// The price a trade settles against right now. Simulated symbols are
    /// fast-forwarded first; live symbols get the 10-second micro-oscillation
    /// while their venue is open (the board row itself is untouched).
    pub fn current_price(&mut self, symbol: &Symbol) -> Option<Price> {
        if sim::is_simulated(symbol) {
            return self.simulate_forward(symbol);
        }

        let point = self.prices.last_known(symbol)?;
        let clock = calendar::market_clock_for_symbol(symbol, self.current_time);
        if !clock.open {
            return Some(point.price);
        }
        let base = point.price.value().to_f64()?;
        Some(sim::to_decimal_price(sim::display_oscillation(
            base,
            symbol,
            self.current_time.as_millis(),
        )))
    }

    /// Batch read for UI layers: latest price and as-of per symbol. Advances
    /// simulated symbols as a side effect; symbols with no price are absent
    /// from the map.
    pub fn latest_prices(&mut self, symbols: &[Symbol]) -> HashMap<Symbol, PricePoint> {
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if sim::is_simulated(symbol) {
                let _ = self.simulate_forward(symbol);
            }
            if let Some(point) = self.prices.last_known(symbol) {
                out.insert(symbol.clone(), point);
            }
        }
        out
    }

    pub fn latest_tick(&self, symbol: &Symbol) -> Option<&PriceTick> {
        self.prices.latest(symbol)
    }

    pub fn price_history(&self, symbol: &Symbol) -> &[PricePoint] {
        self.prices.history(symbol)
    }

    /// Drop chart history older than the configured retention window.
    pub fn prune_price_history(&mut self) -> usize {
        let cutoff = Timestamp::from_millis(
            self.current_time.as_millis() - self.config.history_retention_minutes * 60_000,
        );
        self.prices.prune_history(cutoff)
    }

    // Advance one simulated symbol from its last board row to now. Seeds from
    // reference data when no row exists yet. Same-minute calls return the
    // board price unchanged.
    pub(super) fn simulate_forward(&mut self, symbol: &Symbol) -> Option<Price> {
        let now = self.current_time;

        let start = match self.prices.last_known(symbol) {
            Some(point) => point,
            None => {
                let seed = self.refdata.seed_price(symbol)?;
                self.write_tick(symbol.clone(), seed, now, PriceSource::Seed);
                return Some(seed);
            }
        };

        if now.minute_bucket() <= start.as_of.minute_bucket() {
            return Some(start.price);
        }

        let start_f = start.price.value().to_f64()?;
        let sector = self.refdata.sector_id(symbol).to_string();
        let reference = self
            .refdata
            .seed_price(symbol)
            .and_then(|p| p.value().to_f64());

        let next = sim::advance(
            &self.config.sim,
            start_f,
            symbol,
            &sector,
            start.as_of.as_millis(),
            now.as_millis(),
            reference,
        );

        let price = sim::to_decimal_price(next);
        self.write_tick(symbol.clone(), price, now, PriceSource::Simulated);
        Some(price)
    }

    fn write_tick(&mut self, symbol: Symbol, price: Price, as_of: Timestamp, source: PriceSource) {
        self.prices.upsert_latest(PriceTick {
            symbol: symbol.clone(),
            price,
            as_of,
            source,
        });
        self.prices.append_history_sampled(&symbol, price, as_of);
        self.emit_event(EventPayload::PriceTickWritten(PriceTickEvent {
            symbol,
            price,
            source,
        }));
    }
}
