// 12.1 engine/core.rs: main engine. holds reference data, the price board,
// games, players, positions, orders, snapshots. time is injected; nothing in
// here reads the wall clock.

use super::config::EngineConfig;
use super::results::EngineError;
use super::snapshots::EquityPoint;
use crate::events::{Event, EventId, EventPayload, GameCreatedEvent, PlayerJoinedEvent};
use crate::game::{Game, GameParams, GamePlayer, GameStatus};
use crate::instrument::RefData;
use crate::order::{OrderRecord, OrderStatus, PendingOrder};
use crate::position::{Position, PositionKey};
use crate::price::PriceBoard;
use crate::types::{fx_rate_to_chf, GameId, Money, OrderId, Side, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/** 12.1.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) refdata: RefData,
    pub(super) prices: PriceBoard,
    pub(super) games: HashMap<GameId, Game>,
    pub(super) players: HashMap<(GameId, UserId), GamePlayer>,
    pub(super) positions: HashMap<PositionKey, Position>,
    // BTreeMap so sweep order is deterministic (oldest order id first).
    pub(super) pending: BTreeMap<OrderId, PendingOrder>,
    pub(super) history: Vec<OrderRecord>,
    pub(super) snapshots: HashMap<(GameId, UserId), Vec<EquityPoint>>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_order_id: u64,
    pub(super) next_game_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig, refdata: RefData) -> Self {
        Self {
            config,
            refdata,
            prices: PriceBoard::new(),
            games: HashMap::new(),
            players: HashMap::new(),
            positions: HashMap::new(),
            pending: BTreeMap::new(),
            history: Vec::new(),
            snapshots: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_order_id: 1,
            next_game_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn refdata(&self) -> &RefData {
        &self.refdata
    }

    // ---- game administration ----

    pub fn create_game(&mut self, params: GameParams) -> GameId {
        let id = GameId(self.next_game_id);
        self.next_game_id += 1;

        let game = Game {
            id,
            status: GameStatus::Active,
            starts_at: self.current_time,
            ends_at: self.current_time.add_minutes(params.duration_minutes),
            initial_cash: params.initial_cash,
            fee_bps: params.fee_bps,
            fee_cap: params.fee_cap,
            allow_fractional: params.allow_fractional,
            min_order_amount: params.min_order_amount,
        };

        self.emit_event(EventPayload::GameCreated(GameCreatedEvent {
            game_id: id,
            initial_cash: game.initial_cash,
        }));

        self.games.insert(id, game);
        id
    }

    /// Join a game; the player is seeded with the game's initial cash.
    /// Joining twice is a no-op.
    pub fn join_game(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        display_name: &str,
    ) -> Result<(), EngineError> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;

        if self.players.contains_key(&(game_id, user_id)) {
            return Ok(());
        }

        let player = GamePlayer::new(
            game_id,
            user_id,
            game.initial_cash,
            display_name.to_string(),
            self.current_time,
        );
        self.players.insert((game_id, user_id), player);

        self.emit_event(EventPayload::PlayerJoined(PlayerJoinedEvent { game_id, user_id }));
        Ok(())
    }

    /// Admin override: end a game now. Resting orders are expired (and their
    /// reservations refunded) by the next sweep.
    pub fn finish_game(&mut self, game_id: GameId) -> Result<(), EngineError> {
        let now = self.current_time;
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        game.status = GameStatus::Finished;
        game.ends_at = now;
        Ok(())
    }

    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        self.games.get(&game_id)
    }

    pub fn player(&self, game_id: GameId, user_id: UserId) -> Option<&GamePlayer> {
        self.players.get(&(game_id, user_id))
    }

    pub fn position(&self, game_id: GameId, user_id: UserId, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(&(game_id, user_id, symbol.clone()))
    }

    pub fn pending_order(&self, order_id: OrderId) -> Option<&PendingOrder> {
        self.pending.get(&order_id)
    }

    // ---- read-side views for UI layers ----

    /// Everything the portfolio page needs in one call.
    pub fn portfolio(&self, game_id: GameId, user_id: UserId) -> Result<Portfolio, EngineError> {
        let player = self
            .players
            .get(&(game_id, user_id))
            .ok_or(EngineError::PlayerNotFound(game_id, user_id))?;

        let mut positions: Vec<Position> = self
            .positions
            .values()
            .filter(|p| p.game_id == game_id && p.user_id == user_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let pending_orders: Vec<PendingOrder> = self
            .pending
            .values()
            .filter(|o| {
                o.game_id == game_id && o.user_id == user_id && o.status == OrderStatus::Open
            })
            .cloned()
            .collect();

        let order_history: Vec<OrderRecord> = self
            .history
            .iter()
            .filter(|o| o.game_id == game_id && o.user_id == user_id)
            .cloned()
            .collect();

        Ok(Portfolio {
            cash: player.cash,
            reserved: player.reserved,
            positions,
            pending_orders,
            order_history,
        })
    }

    /// Players ranked by total valuation. Reserved cash and escrowed sell
    /// shares count toward the total so an open limit order does not read as
    /// a loss.
    pub fn leaderboard(&self, game_id: GameId) -> Vec<LeaderboardEntry> {
        let initial_cash = match self.games.get(&game_id) {
            Some(game) => game.initial_cash.value(),
            None => return Vec::new(),
        };

        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .map(|player| {
                let mut total = player.cash.value() + player.reserved.value();
                for position in self.positions.values() {
                    if position.game_id != game_id || position.user_id != player.user_id {
                        continue;
                    }
                    if let Some(point) = self.prices.last_known(&position.symbol) {
                        total += position.qty
                            * point.price.value()
                            * fx_rate_to_chf(self.currency_of(&position.symbol));
                    }
                }
                total += self.escrowed_shares_value(game_id, player.user_id).value();
                let pnl = total - initial_cash;
                let pnl_pct = if initial_cash > Decimal::ZERO {
                    pnl / initial_cash * Decimal::ONE_HUNDRED
                } else {
                    Decimal::ZERO
                };
                LeaderboardEntry {
                    user_id: player.user_id,
                    display_name: player.display_name.clone(),
                    cash: player.cash,
                    total_value: Money::new(total),
                    pnl: Money::new(pnl),
                    pnl_pct,
                }
            })
            .collect();

        entries.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        entries
    }

    /// Mark-to-market value of shares held in escrow by open sell limit
    /// orders. Missing prices omit the order, as in position valuation.
    pub(super) fn escrowed_shares_value(&self, game_id: GameId, user_id: UserId) -> Money {
        let mut total = Decimal::ZERO;
        for order in self.pending.values() {
            if order.game_id != game_id
                || order.user_id != user_id
                || order.side != Side::Sell
                || order.status != OrderStatus::Open
            {
                continue;
            }
            if let Some(point) = self.prices.last_known(&order.symbol) {
                total += order.qty
                    * point.price.value()
                    * fx_rate_to_chf(self.currency_of(&order.symbol));
            }
        }
        Money::new(total)
    }

    pub fn open_order_count(&self) -> usize {
        self.pending
            .values()
            .filter(|o| o.status == OrderStatus::Open)
            .count()
    }

    // ---- events ----

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    pub(super) fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }
}

/// Portfolio view for one (game, user).
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: Money,
    pub reserved: Money,
    pub positions: Vec<Position>,
    pub pending_orders: Vec<PendingOrder>,
    pub order_history: Vec<OrderRecord>,
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub display_name: String,
    pub cash: Money,
    pub total_value: Money,
    pub pnl: Money,
    pub pnl_pct: Decimal,
}
