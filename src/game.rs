// 5.0: competition state. a Game owns its players, positions and orders
// transitively through its id.

use crate::types::{Bps, GameId, Money, Timestamp, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Draft,
    Active,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub initial_cash: Money,
    pub fee_bps: Bps,
    /// Cap on a single trade's fee, in settlement currency.
    pub fee_cap: Money,
    pub allow_fractional: bool,
    /// Minimum order notional in settlement currency. Zero disables the check.
    pub min_order_amount: Money,
}

impl Game {
    /// Stored status is never trusted verbatim: a game whose end timestamp has
    /// passed is finished no matter what the row says.
    pub fn effective_status(&self, now: Timestamp) -> GameStatus {
        if now >= self.ends_at {
            return GameStatus::Finished;
        }
        self.status
    }

    pub fn is_effectively_active(&self, now: Timestamp) -> bool {
        self.effective_status(now) == GameStatus::Active
    }
}

/// Per-game trading rules with the defaults the game launched with.
#[derive(Debug, Clone)]
pub struct GameParams {
    pub initial_cash: Money,
    pub fee_bps: Bps,
    pub fee_cap: Money,
    pub allow_fractional: bool,
    pub min_order_amount: Money,
    pub duration_minutes: i64,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            initial_cash: Money::new(dec!(100_000)),
            fee_bps: Bps::new(10),
            fee_cap: Money::new(dec!(15)),
            allow_fractional: true,
            min_order_amount: Money::zero(),
            duration_minutes: 7 * 24 * 60,
        }
    }
}

/// One (game, user) membership. Cash is seeded from the game's initial cash
/// and must never go negative. `reserved` holds cash set aside by open buy
/// limit orders; it is unavailable for new trades until fill or cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePlayer {
    pub game_id: GameId,
    pub user_id: UserId,
    pub cash: Money,
    pub reserved: Money,
    pub display_name: String,
    pub joined_at: Timestamp,
}

impl GamePlayer {
    pub fn new(game_id: GameId, user_id: UserId, cash: Money, display_name: String, now: Timestamp) -> Self {
        Self {
            game_id,
            user_id,
            cash,
            reserved: Money::zero(),
            display_name,
            joined_at: now,
        }
    }

    /// Conditional debit: succeeds only when the full amount is covered,
    /// preserving the non-negative cash invariant.
    #[must_use]
    pub fn try_debit(&mut self, amount: Money) -> bool {
        if self.cash < amount {
            return false;
        }
        self.cash = self.cash.sub(amount);
        true
    }

    pub fn credit(&mut self, amount: Money) {
        debug_assert!(amount.value() >= Decimal::ZERO);
        self.cash = self.cash.add(amount);
    }

    /// Move cash into the reservation bucket at limit-order placement.
    #[must_use]
    pub fn try_reserve(&mut self, amount: Money) -> bool {
        if !self.try_debit(amount) {
            return false;
        }
        self.reserved = self.reserved.add(amount);
        true
    }

    /// Return a reservation to spendable cash (cancellation / expiry).
    pub fn release_reservation(&mut self, amount: Money) {
        self.reserved = self.reserved.sub(amount);
        self.cash = self.cash.add(amount);
    }

    /// Consume a reservation at fill time. Fails when the reservation
    /// accounting has drifted below the amount owed.
    #[must_use]
    pub fn try_consume_reservation(&mut self, amount: Money) -> bool {
        if self.reserved < amount {
            return false;
        }
        self.reserved = self.reserved.sub(amount);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn game(status: GameStatus, ends_at: i64) -> Game {
        Game {
            id: GameId(1),
            status,
            starts_at: Timestamp::from_millis(0),
            ends_at: Timestamp::from_millis(ends_at),
            initial_cash: Money::new(dec!(100_000)),
            fee_bps: Bps::new(10),
            fee_cap: Money::new(dec!(15)),
            allow_fractional: true,
            min_order_amount: Money::zero(),
        }
    }

    #[test]
    fn effective_status_overrides_stale_flag() {
        let g = game(GameStatus::Active, 1_000);
        assert_eq!(g.effective_status(Timestamp::from_millis(500)), GameStatus::Active);
        // stored flag still says active, but the clock has run out
        assert_eq!(g.effective_status(Timestamp::from_millis(1_000)), GameStatus::Finished);
        assert_eq!(g.effective_status(Timestamp::from_millis(2_000)), GameStatus::Finished);
    }

    #[test]
    fn draft_game_is_not_active() {
        let g = game(GameStatus::Draft, i64::MAX);
        assert!(!g.is_effectively_active(Timestamp::from_millis(0)));
    }

    #[test]
    fn debit_requires_cover() {
        let mut p = GamePlayer::new(
            GameId(1),
            UserId(1),
            Money::new(dec!(100)),
            "alice".into(),
            Timestamp::from_millis(0),
        );
        assert!(!p.try_debit(Money::new(dec!(100.01))));
        assert_eq!(p.cash.value(), dec!(100));
        assert!(p.try_debit(Money::new(dec!(100))));
        assert_eq!(p.cash.value(), dec!(0));
    }

    #[test]
    fn reservation_round_trip() {
        let mut p = GamePlayer::new(
            GameId(1),
            UserId(1),
            Money::new(dec!(500)),
            "bob".into(),
            Timestamp::from_millis(0),
        );
        assert!(p.try_reserve(Money::new(dec!(200))));
        assert_eq!(p.cash.value(), dec!(300));
        assert_eq!(p.reserved.value(), dec!(200));

        p.release_reservation(Money::new(dec!(200)));
        assert_eq!(p.cash.value(), dec!(500));
        assert_eq!(p.reserved.value(), dec!(0));
    }

    #[test]
    fn reservation_consumed_at_fill() {
        let mut p = GamePlayer::new(
            GameId(1),
            UserId(1),
            Money::new(dec!(500)),
            "bob".into(),
            Timestamp::from_millis(0),
        );
        assert!(p.try_reserve(Money::new(dec!(200))));
        assert!(p.try_consume_reservation(Money::new(dec!(200))));
        assert_eq!(p.cash.value(), dec!(300));
        assert_eq!(p.reserved.value(), dec!(0));
        assert!(!p.try_consume_reservation(Money::new(dec!(1))));
    }
}
