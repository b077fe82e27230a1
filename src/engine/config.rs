//! Engine configuration options.

use crate::sim::SimParams;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Total bid/ask spread applied to market orders, as a fraction of mid.
    pub spread_pct: Decimal,
    /// Maximum open orders examined per matching sweep.
    pub sweep_batch_size: usize,
    /// Price history retention window in minutes.
    pub history_retention_minutes: i64,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Price simulator constants.
    pub sim: SimParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spread_pct: dec!(0.0008),
            sweep_batch_size: 500,
            history_retention_minutes: 7 * 24 * 60,
            max_events: 100_000,
            verbose: false,
            sim: SimParams::default(),
        }
    }
}
