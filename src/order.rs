// 7.0: order records and the resting-order state machine.
//
// a PendingOrder leaves `open` exactly once: every transition goes through
// `try_transition`, the in-memory equivalent of
// `update ... set status = X where status = 'open'`. redundant matching sweeps
// therefore cannot double-fill.

use crate::types::{GameId, Money, OrderId, Price, Side, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Immutable record of an executed fill. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub game_id: GameId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    /// Execution price in instrument currency.
    pub price: Price,
    /// Fee charged, settlement currency.
    pub fee: Money,
    pub executed_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        *self != OrderStatus::Open
    }
}

/// A resting limit order. Buys hold a cash reservation (recomputable from qty
/// and limit); sells escrow the shares themselves, remembering the average
/// cost they were carved out at so cancellation restores the basis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: OrderId,
    pub game_id: GameId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub qty: Decimal,
    pub limit_price: Price,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub fill_price: Option<Price>,
    pub fee: Option<Money>,
    /// Average cost of the escrowed shares at placement. Sell orders only.
    pub reserved_avg_cost: Option<Price>,
}

impl PendingOrder {
    pub fn new(
        id: OrderId,
        game_id: GameId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        qty: Decimal,
        limit_price: Price,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            game_id,
            user_id,
            symbol,
            side,
            qty,
            limit_price,
            status: OrderStatus::Open,
            created_at: now,
            closed_at: None,
            fill_price: None,
            fee: None,
            reserved_avg_cost: None,
        }
    }

    /// One-way conditional transition out of `open`. Returns false when the
    /// order already left `open`, so a retried or concurrent sweep is a no-op.
    #[must_use]
    pub fn try_transition(&mut self, to: OrderStatus, now: Timestamp) -> bool {
        debug_assert!(to.is_terminal());
        if self.status != OrderStatus::Open {
            return false;
        }
        self.status = to;
        self.closed_at = Some(now);
        true
    }

    /// Fill condition against the current market price. Buys fill at or below
    /// the limit, sells at or above, with a rounding tolerance proportional to
    /// the limit price. Execution is always at the limit price itself.
    pub fn should_fill(&self, market_price: Price) -> bool {
        let limit = self.limit_price.value();
        let eps = (limit * dec!(0.0001)).max(dec!(0.0001));
        match self.side {
            Side::Buy => market_price.value() <= limit + eps,
            Side::Sell => market_price.value() >= limit - eps,
        }
    }
}

/// Maximum relative distance between a limit price and the market price at
/// placement. Rejects orders that could never fill or trivially front-run the
/// simulator.
pub const LIMIT_DEVIATION_MAX: Decimal = dec!(0.10);

pub fn limit_within_tolerance(limit_price: Price, market_price: Price) -> bool {
    let deviation =
        (limit_price.value() - market_price.value()).abs() / market_price.value();
    deviation <= LIMIT_DEVIATION_MAX
}

/// Simulated bid/ask around a mid price: fixed 0.08% spread, 4dp rounding.
/// Market buys lift the ask, market sells hit the bid.
pub fn bid_ask(mid: Price, spread_pct: Decimal) -> (Price, Price) {
    let half = mid.value() * spread_pct * dec!(0.5);
    let round = |v: Decimal| {
        v.round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    };
    let bid = round(mid.value() - half).max(dec!(0.0001));
    let ask = round(mid.value() + half);
    (Price::new_unchecked(bid), Price::new_unchecked(ask))
}

pub const DEFAULT_SPREAD_PCT: Decimal = dec!(0.0008);

#[cfg(test)]
mod tests {
    use super::*;

    fn order(side: Side, limit: Decimal) -> PendingOrder {
        PendingOrder::new(
            OrderId(1),
            GameId(1),
            UserId(1),
            Symbol::from("NESN.SW"),
            side,
            dec!(10),
            Price::new_unchecked(limit),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn transition_is_one_way() {
        let mut o = order(Side::Buy, dec!(100));
        assert!(o.try_transition(OrderStatus::Filled, Timestamp::from_millis(1)));
        assert!(!o.try_transition(OrderStatus::Cancelled, Timestamp::from_millis(2)));
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.closed_at, Some(Timestamp::from_millis(1)));
    }

    #[test]
    fn buy_fills_at_or_below_limit() {
        let o = order(Side::Buy, dec!(100));
        assert!(o.should_fill(Price::new_unchecked(dec!(99))));
        assert!(o.should_fill(Price::new_unchecked(dec!(100))));
        // inside the rounding tolerance (1bp of the limit)
        assert!(o.should_fill(Price::new_unchecked(dec!(100.005))));
        assert!(!o.should_fill(Price::new_unchecked(dec!(100.2))));
    }

    #[test]
    fn sell_fills_at_or_above_limit() {
        let o = order(Side::Sell, dec!(100));
        assert!(o.should_fill(Price::new_unchecked(dec!(101))));
        assert!(o.should_fill(Price::new_unchecked(dec!(100))));
        assert!(o.should_fill(Price::new_unchecked(dec!(99.995))));
        assert!(!o.should_fill(Price::new_unchecked(dec!(99.5))));
    }

    #[test]
    fn deviation_tolerance() {
        let market = Price::new_unchecked(dec!(100));
        assert!(limit_within_tolerance(Price::new_unchecked(dec!(110)), market));
        assert!(limit_within_tolerance(Price::new_unchecked(dec!(90)), market));
        assert!(!limit_within_tolerance(Price::new_unchecked(dec!(110.01)), market));
        assert!(!limit_within_tolerance(Price::new_unchecked(dec!(89.99)), market));
    }

    #[test]
    fn spread_brackets_mid() {
        let (bid, ask) = bid_ask(Price::new_unchecked(dec!(50)), DEFAULT_SPREAD_PCT);
        assert!(bid.value() < dec!(50));
        assert!(ask.value() > dec!(50));
        assert_eq!(bid.value(), dec!(49.98));
        assert_eq!(ask.value(), dec!(50.02));
    }
}
