// 4.0: deterministic price simulator. every observer computing the same
// (symbol, minute) gets the identical price, so redundant recomputation is
// harmless and no tick-by-tick randomness ledger is needed.
//
// the per-minute return is a sum of independently seeded components:
//   idiosyncratic noise * intraday vol curve, event spikes, sector drift,
//   market-wide sentiment (15-min windows), momentum, mean reversion.
// all seeds derive from string hashes of (symbol | sector | market, minute);
// wall-clock entropy never enters the model.

use crate::types::{Price, Symbol};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Simulation constants. Injected, not ambient; `Default` matches the tuned
/// game feel (visible but plausible swings).
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Base per-minute volatility before the intraday curve is applied.
    pub base_sigma: f64,
    /// Chance per minute of a news-event spike.
    pub event_probability: f64,
    /// Volatility multiplier during an event minute.
    pub event_multiplier: f64,
    /// Scale of the shared per-sector component.
    pub sector_sigma: f64,
    /// Width of the market-wide sentiment band (uniform, centered on zero).
    pub sentiment_range: f64,
    /// Sigma of the previous minute's draw used for trend persistence.
    pub momentum_sigma: f64,
    /// Fraction of the previous minute's draw that carries forward.
    pub momentum_carry: f64,
    /// Pull per minute toward the reference price, per unit of relative deviation.
    pub mean_reversion: f64,
    /// Bounded catch-up: `advance` never replays more minutes than this.
    pub max_catchup_minutes: i64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            base_sigma: 0.005,
            event_probability: 0.05,
            event_multiplier: 3.0,
            sector_sigma: 0.002,
            sentiment_range: 0.006,
            momentum_sigma: 0.006,
            momentum_carry: 0.3,
            mean_reversion: 0.008,
            max_catchup_minutes: 480,
        }
    }
}

// 4.1: mulberry32. 32-bit state, wrapping arithmetic, uniform output in [0, 1).
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }
}

// 31-multiplier string hash. Stable across processes, unlike std's hasher.
fn hash_str(s: &str) -> u32 {
    let mut h: i32 = 0;
    for b in s.bytes() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(b));
    }
    h as u32
}

// Box-Muller: two uniform draws to one standard normal.
fn normal_draw(rng: &mut Mulberry32) -> f64 {
    let u1 = rng.next().max(1e-10);
    let u2 = rng.next();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Whether a symbol's price is simulated rather than fed from a live quote.
/// Any dotted (non-US) listing is simulated; `BRK.B` is the US exception.
pub fn is_simulated(symbol: &Symbol) -> bool {
    symbol.suffix().is_some()
}

// 4.2: intraday volatility multiplier, CET clock (fixed UTC+1, no DST).
// two-peak curve: peaks at the 09:00 open and 17:30 close, trough at 13:00,
// flat 0.4 outside 08h-18h. range roughly 0.6..1.8.
fn intraday_vol_multiplier(timestamp_ms: i64) -> f64 {
    let utc_hours = (timestamp_ms as f64 / 3_600_000.0).rem_euclid(24.0);
    let cet_hour = (utc_hours + 1.0).rem_euclid(24.0);

    if !(8.0..=18.0).contains(&cet_hour) {
        return 0.4;
    }

    let open_dist = (cet_hour - 9.0).abs();
    let close_dist = (cet_hour - 17.5).abs();
    let open_peak = (-0.5 * open_dist * open_dist).exp();
    let close_peak = (-0.5 * close_dist * close_dist).exp();
    let peak = open_peak.max(close_peak);

    0.6 + 1.2 * peak
}

// market-wide drift, re-rolled every 15 minutes, identical for all symbols.
fn market_sentiment(params: &SimParams, timestamp_ms: i64) -> f64 {
    let window = timestamp_ms.div_euclid(15 * 60_000);
    let mut rng = Mulberry32::new(hash_str(&format!("market:{window}")));
    (rng.next() - 0.5) * params.sentiment_range
}

// shared by every symbol carrying the same sector tag for this minute.
fn sector_drift(params: &SimParams, sector_id: &str, timestamp_ms: i64) -> f64 {
    let minute = timestamp_ms.div_euclid(60_000);
    let mut rng = Mulberry32::new(hash_str(&format!("sector:{sector_id}:{minute}")));
    normal_draw(&mut rng) * params.sector_sigma
}

// trend persistence: a fraction of the previous minute's idiosyncratic draw.
fn momentum_drift(params: &SimParams, symbol: &Symbol, timestamp_ms: i64) -> f64 {
    let minute = timestamp_ms.div_euclid(60_000);
    let mut rng = Mulberry32::new(hash_str(&format!("{}:{}", symbol.as_str(), minute - 1)));
    normal_draw(&mut rng) * params.momentum_sigma * params.momentum_carry
}

/// Next price for one minute tick. Pure and idempotent: re-evaluating the same
/// inputs always yields the same output. `last_price > 0` is a caller contract.
pub fn next_price(
    params: &SimParams,
    last_price: f64,
    symbol: &Symbol,
    sector_id: &str,
    timestamp_ms: i64,
    reference_price: Option<f64>,
) -> f64 {
    debug_assert!(last_price > 0.0);

    let minute = timestamp_ms.div_euclid(60_000);
    let mut rng = Mulberry32::new(hash_str(&format!("{}:{}", symbol.as_str(), minute)));

    let z = normal_draw(&mut rng);
    let event_roll = rng.next();

    let mut sigma = params.base_sigma * intraday_vol_multiplier(timestamp_ms);
    if event_roll < params.event_probability {
        sigma *= params.event_multiplier;
    }

    let idiosyncratic = sigma * z;
    let sector = sector_drift(params, sector_id, timestamp_ms);
    let sentiment = market_sentiment(params, timestamp_ms);
    let momentum = momentum_drift(params, symbol, timestamp_ms);

    let mean_rev = match reference_price {
        Some(reference) if reference > 0.0 => {
            -params.mean_reversion * (last_price - reference) / reference
        }
        _ => 0.0,
    };

    let total = idiosyncratic + sector + sentiment + momentum + mean_rev;
    round_price(last_price * (1.0 + total))
}

/// Replay `next_price` minute-by-minute between two timestamps. Step count is
/// capped so catch-up after a long outage stays bounded; same-minute calls are
/// a no-op.
pub fn advance(
    params: &SimParams,
    start_price: f64,
    symbol: &Symbol,
    sector_id: &str,
    from_timestamp_ms: i64,
    to_timestamp_ms: i64,
    reference_price: Option<f64>,
) -> f64 {
    let from_minute = from_timestamp_ms.div_euclid(60_000);
    let to_minute = to_timestamp_ms.div_euclid(60_000);

    if to_minute <= from_minute {
        return start_price;
    }

    let steps = (to_minute - from_minute).min(params.max_catchup_minutes);
    let mut price = start_price;
    for i in 1..=steps {
        let tick_ms = (from_minute + i) * 60_000;
        price = next_price(params, price, symbol, sector_id, tick_ms, reference_price);
    }
    price
}

// clamp to a penny and round to 4 decimals, half away from zero.
fn round_price(price: f64) -> f64 {
    ((price * 10_000.0).round() / 10_000.0).max(0.01)
}

/// Float price to the Decimal the store keeps. The float is already at 4dp, so
/// the decimal rounding only strips conversion noise.
pub fn to_decimal_price(price: f64) -> Price {
    let d = Decimal::from_f64(price)
        .unwrap_or(Decimal::ONE)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    Price::new(d).unwrap_or_else(|| Price::new_unchecked(Decimal::new(1, 2)))
}

/// Cosmetic micro-oscillation (±0.05%) for live-quoted symbols between feed
/// refreshes. Re-rolls every 10 seconds; deterministic per (symbol, bucket).
pub fn display_oscillation(price: f64, symbol: &Symbol, now_ms: i64) -> f64 {
    let bucket = now_ms.div_euclid(10_000);
    let seed = u64::from(hash_str(symbol.as_str())) ^ (bucket as u64);
    let mixed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
    let unit = ((mixed >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0;
    round_price(price * (1.0 + unit * 0.0005))
}
