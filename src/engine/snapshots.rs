// 12.5 engine/snapshots.rs: equity snapshots per (game, player). one point is
// appended after every fill and on demand; the series backs the performance
// chart and the leaderboard's pnl history.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, SnapshotRecordedEvent};
use crate::types::{fx_rate_to_chf, GameId, Money, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// One point on a player's equity curve, in settlement currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub as_of: Timestamp,
    /// Spendable cash.
    pub cash: Money,
    /// Cash held by open buy limit orders.
    pub reserved: Money,
    /// Mark-to-market value of all positions with a known price. Positions
    /// without any price on the board are omitted rather than guessed.
    pub positions_value: Money,
    pub total: Money,
}

impl Engine {
    /// Value the player right now and append the point to their equity series.
    pub fn record_equity_snapshot(
        &mut self,
        game_id: GameId,
        user_id: UserId,
    ) -> Result<EquityPoint, EngineError> {
        let player = self
            .players
            .get(&(game_id, user_id))
            .ok_or(EngineError::PlayerNotFound(game_id, user_id))?;
        let cash = player.cash;
        let reserved = player.reserved;

        let mut positions_value = Money::zero();
        for position in self.positions.values() {
            if position.game_id != game_id || position.user_id != user_id {
                continue;
            }
            if let Some(point) = self.prices.last_known(&position.symbol) {
                let fx = fx_rate_to_chf(self.currency_of(&position.symbol));
                positions_value =
                    positions_value.add(Money::new(position.market_value(point.price) * fx));
            }
        }
        // shares escrowed by open sell limits still belong to the player
        positions_value = positions_value.add(self.escrowed_shares_value(game_id, user_id));

        let point = EquityPoint {
            as_of: self.current_time,
            cash,
            reserved,
            positions_value,
            total: cash.add(reserved).add(positions_value),
        };

        self.snapshots
            .entry((game_id, user_id))
            .or_default()
            .push(point.clone());

        self.emit_event(EventPayload::SnapshotRecorded(SnapshotRecordedEvent {
            game_id,
            user_id,
            total_value: point.total,
        }));

        Ok(point)
    }

    /// Snapshot every player in a game. Used by a periodic valuation pass.
    pub fn record_game_snapshots(&mut self, game_id: GameId) -> usize {
        let users: Vec<UserId> = self
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .map(|p| p.user_id)
            .collect();
        let mut recorded = 0;
        for user_id in users {
            if self.record_equity_snapshot(game_id, user_id).is_ok() {
                recorded += 1;
            }
        }
        recorded
    }

    pub fn equity_history(&self, game_id: GameId, user_id: UserId) -> &[EquityPoint] {
        self.snapshots
            .get(&(game_id, user_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
