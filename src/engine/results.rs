// 12.0.2: result types and errors for engine operations.

use crate::types::{GameId, Money, OrderId, Price, Side, Symbol, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Synchronous rejection reasons. Validation and resource failures are
/// reported, never thrown as panics; no state is left half-mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidQuantity,
    WholeSharesRequired,
    BelowMinimumAmount,
    PriceUnavailable,
    GameNotActive,
    LimitPriceOutOfRange,
    InsufficientCash,
    InsufficientPosition,
}

/// An executed trade, as returned to the caller.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    /// Execution price in instrument currency.
    pub price: Price,
    /// Notional in settlement currency, before fee.
    pub notional: Money,
    pub fee: Money,
    pub new_cash: Money,
}

/// Outcome of placeOrder: market orders execute, limit orders rest.
#[derive(Debug, Clone)]
pub enum PlaceOutcome {
    Executed(TradeOutcome),
    Resting(OrderId),
}

/// Tally of one matching sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepResult {
    pub scanned: usize,
    pub filled: usize,
    pub cancelled: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Game {0:?} not found")]
    GameNotFound(GameId),

    #[error("User {1:?} is not a member of game {0:?}")]
    PlayerNotFound(GameId, UserId),

    #[error("Order {0:?} not found")]
    OrderNotFound(OrderId),

    #[error("Order {0:?} does not belong to the requesting user")]
    NotOrderOwner(OrderId),

    #[error("Order {0:?} is no longer open")]
    OrderNotOpen(OrderId),

    #[error("Order rejected: {0:?}")]
    Rejected(RejectReason),
}

impl EngineError {
    pub fn reject(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}
