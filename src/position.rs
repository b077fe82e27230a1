// 6.0: holdings. one Position per (game, user, symbol), created on first buy,
// deleted when quantity reaches zero. avg cost is in the instrument currency.

use crate::types::{GameId, Price, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type PositionKey = (GameId, UserId, Symbol);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub game_id: GameId,
    pub user_id: UserId,
    pub symbol: Symbol,
    /// Quantity held. Non-negative; fractional when the game allows it.
    pub qty: Decimal,
    /// Quantity-weighted average cost in instrument currency.
    pub avg_cost: Price,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn open(
        game_id: GameId,
        user_id: UserId,
        symbol: Symbol,
        qty: Decimal,
        price: Price,
        now: Timestamp,
    ) -> Self {
        debug_assert!(qty > Decimal::ZERO);
        Self {
            game_id,
            user_id,
            symbol,
            qty,
            avg_cost: price,
            updated_at: now,
        }
    }

    pub fn key(&self) -> PositionKey {
        (self.game_id, self.user_id, self.symbol.clone())
    }

    // 6.1: buys re-average the cost basis; sells leave it untouched.
    pub fn apply_buy(&mut self, qty: Decimal, price: Price, now: Timestamp) {
        debug_assert!(qty > Decimal::ZERO);
        let old_notional = self.qty * self.avg_cost.value();
        let new_qty = self.qty + qty;
        let new_avg = (old_notional + qty * price.value()) / new_qty;
        self.qty = new_qty;
        self.avg_cost = Price::new_unchecked(new_avg);
        self.updated_at = now;
    }

    /// Reduce the position by `qty`. Returns false (no mutation) when the
    /// position does not cover the reduction. A true return with zero
    /// remaining quantity means the row should be deleted.
    #[must_use]
    pub fn try_reduce(&mut self, qty: Decimal, now: Timestamp) -> bool {
        debug_assert!(qty > Decimal::ZERO);
        if self.qty < qty {
            return false;
        }
        self.qty -= qty;
        self.updated_at = now;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.qty.is_zero()
    }

    /// Mark-to-market value in instrument currency.
    pub fn market_value(&self, price: Price) -> Decimal {
        self.qty * price.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pos(qty: Decimal, avg: Decimal) -> Position {
        Position::open(
            GameId(1),
            UserId(1),
            Symbol::from("NESN.SW"),
            qty,
            Price::new_unchecked(avg),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn buy_averages_cost() {
        let mut p = pos(dec!(10), dec!(100));
        p.apply_buy(dec!(10), Price::new_unchecked(dec!(110)), Timestamp::from_millis(1));
        assert_eq!(p.qty, dec!(20));
        assert_eq!(p.avg_cost.value(), dec!(105));
    }

    #[test]
    fn sell_keeps_cost_basis() {
        let mut p = pos(dec!(10), dec!(100));
        assert!(p.try_reduce(dec!(4), Timestamp::from_millis(1)));
        assert_eq!(p.qty, dec!(6));
        assert_eq!(p.avg_cost.value(), dec!(100));
    }

    #[test]
    fn reduce_rejects_oversell() {
        let mut p = pos(dec!(3), dec!(50));
        assert!(!p.try_reduce(dec!(3.5), Timestamp::from_millis(1)));
        assert_eq!(p.qty, dec!(3));
    }

    #[test]
    fn full_reduction_flags_empty() {
        let mut p = pos(dec!(2), dec!(50));
        assert!(p.try_reduce(dec!(2), Timestamp::from_millis(1)));
        assert!(p.is_empty());
    }

    #[test]
    fn fractional_quantities() {
        let mut p = pos(dec!(0.5), dec!(200));
        p.apply_buy(dec!(0.25), Price::new_unchecked(dec!(220)), Timestamp::from_millis(1));
        assert_eq!(p.qty, dec!(0.75));
        // (0.5*200 + 0.25*220) / 0.75
        assert_eq!(p.avg_cost.value().round_dp(4), dec!(206.6667));
    }
}
