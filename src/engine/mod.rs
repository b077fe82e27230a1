// 12.0: core game engine. coordinates price advancement, order placement,
// the matching sweep, settlement, and equity snapshots.
// deterministic and event-driven with no external I/O.

mod config;
mod core;
mod matching;
mod orders;
mod pricing;
mod results;
mod snapshots;

pub use self::core::{Engine, LeaderboardEntry, Portfolio};
pub use config::EngineConfig;
pub use results::{EngineError, PlaceOutcome, RejectReason, SweepResult, TradeOutcome};
pub use snapshots::EquityPoint;
