// 9.0: every state change produces an event. used for audit trails and for
// notifying external layers (UI toasts, news feed). the EventPayload enum
// lists all event types.

use crate::types::{GameId, Money, OrderId, Price, Side, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // trade events
    Trade(TradeEvent),
    LimitOrderPlaced(LimitOrderPlacedEvent),
    OrderClosed(OrderClosedEvent),

    // price events
    PriceTickWritten(PriceTickEvent),

    // game events
    GameCreated(GameCreatedEvent),
    PlayerJoined(PlayerJoinedEvent),

    // valuation events
    SnapshotRecorded(SnapshotRecordedEvent),
}

/// An executed fill, market or limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub game_id: GameId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    pub price: Price,
    pub fee: Money,
    pub from_limit: Option<OrderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrderPlacedEvent {
    pub game_id: GameId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    pub limit_price: Price,
    /// Cash reserved at placement (buys only).
    pub reserved: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderClosedEvent {
    pub game_id: GameId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub reason: CloseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Filled,
    UserCancelled,
    /// Cancelled by the sweep: reservation accounting no longer covered the fill.
    InsufficientFunds,
    /// Sell-side analog: the share escrow no longer covered the fill.
    InsufficientShares,
    GameExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTickEvent {
    pub symbol: Symbol,
    pub price: Price,
    pub source: crate::price::PriceSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCreatedEvent {
    pub game_id: GameId,
    pub initial_cash: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedEvent {
    pub game_id: GameId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecordedEvent {
    pub game_id: GameId,
    pub user_id: UserId,
    pub total_value: Money,
}
