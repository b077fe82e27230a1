// 12.3 engine/orders.rs: order placement and cancellation.
//
// market orders settle synchronously against the simulated bid/ask. limit
// orders rest: buys move cash into the player's reservation bucket at
// placement, sells escrow the shares out of the position. every rejection
// leaves state unmodified.

use super::core::Engine;
use super::results::{EngineError, PlaceOutcome, RejectReason, TradeOutcome};
use crate::events::{CloseReason, EventPayload, LimitOrderPlacedEvent, OrderClosedEvent, TradeEvent};
use crate::fees;
use crate::instrument::currency_for_symbol;
use crate::order::{bid_ask, limit_within_tolerance, OrderRecord, OrderStatus, PendingOrder};
use crate::position::Position;
use crate::types::{fx_rate_to_chf, Currency, GameId, Money, OrderId, Price, Side, Symbol, UserId};
use rust_decimal::Decimal;

impl Engine {
    /// Place an order. A market order (no limit) executes immediately; a limit
    /// order rests until the matching sweep fills, cancels, or expires it.
    pub fn place_order(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        qty: Decimal,
        limit_price: Option<Price>,
    ) -> Result<PlaceOutcome, EngineError> {
        match limit_price {
            None => self
                .place_market_order(game_id, user_id, symbol, side, qty)
                .map(PlaceOutcome::Executed),
            Some(limit) => self
                .place_limit_order(game_id, user_id, symbol, side, qty, limit)
                .map(PlaceOutcome::Resting),
        }
    }

    /// Execute a market order at the simulated bid/ask and settle it: cash,
    /// position, fee, order record, equity snapshot.
    pub fn place_market_order(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        qty: Decimal,
    ) -> Result<TradeOutcome, EngineError> {
        let (fee_bps, fee_cap, min_order_amount) =
            self.validate_order_basics(game_id, user_id, qty)?;

        let mid = self
            .current_price(&symbol)
            .ok_or(EngineError::reject(RejectReason::PriceUnavailable))?;

        // buys lift the ask, sells hit the bid
        let (bid, ask) = bid_ask(mid, self.config.spread_pct);
        let exec_price = match side {
            Side::Buy => ask,
            Side::Sell => bid,
        };

        let currency = self.currency_of(&symbol);
        let notional = fees::notional_in_settlement(qty, exec_price, fx_rate_to_chf(currency));
        if notional < min_order_amount {
            return Err(EngineError::reject(RejectReason::BelowMinimumAmount));
        }
        let fee = fees::fee_for_notional(notional, fee_bps, fee_cap);

        let now = self.current_time;
        let key = (game_id, user_id, symbol.clone());

        match side {
            Side::Buy => {
                let total = notional.add(fee);
                let player = self
                    .players
                    .get_mut(&(game_id, user_id))
                    .ok_or(EngineError::PlayerNotFound(game_id, user_id))?;
                if !player.try_debit(total) {
                    return Err(EngineError::reject(RejectReason::InsufficientCash));
                }
                self.positions
                    .entry(key)
                    .and_modify(|p| p.apply_buy(qty, exec_price, now))
                    .or_insert_with(|| {
                        Position::open(game_id, user_id, symbol.clone(), qty, exec_price, now)
                    });
            }
            Side::Sell => {
                let position = self
                    .positions
                    .get_mut(&key)
                    .ok_or(EngineError::reject(RejectReason::InsufficientPosition))?;
                if !position.try_reduce(qty, now) {
                    return Err(EngineError::reject(RejectReason::InsufficientPosition));
                }
                if position.is_empty() {
                    self.positions.remove(&key);
                }
                let proceeds = notional.sub(fee);
                if let Some(player) = self.players.get_mut(&(game_id, user_id)) {
                    player.credit(proceeds);
                }
            }
        }

        let new_cash = self
            .players
            .get(&(game_id, user_id))
            .map(|p| p.cash)
            .unwrap_or_else(Money::zero);

        self.history.push(OrderRecord {
            game_id,
            user_id,
            symbol: symbol.clone(),
            side,
            qty,
            price: exec_price,
            fee,
            executed_at: now,
        });

        self.emit_event(EventPayload::Trade(TradeEvent {
            game_id,
            user_id,
            symbol: symbol.clone(),
            side,
            qty,
            price: exec_price,
            fee,
            from_limit: None,
        }));

        let _ = self.record_equity_snapshot(game_id, user_id);

        Ok(TradeOutcome {
            symbol,
            side,
            qty,
            price: exec_price,
            notional,
            fee,
            new_cash,
        })
    }

    /// Rest a limit order. The limit must be within 10% of the current market
    /// price. Buys reserve notional plus fee (at the limit price) immediately;
    /// sells escrow the shares, remembering their cost basis for restoration.
    pub fn place_limit_order(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        qty: Decimal,
        limit_price: Price,
    ) -> Result<OrderId, EngineError> {
        let (fee_bps, fee_cap, min_order_amount) =
            self.validate_order_basics(game_id, user_id, qty)?;

        let market = self
            .current_price(&symbol)
            .ok_or(EngineError::reject(RejectReason::PriceUnavailable))?;
        if !limit_within_tolerance(limit_price, market) {
            return Err(EngineError::reject(RejectReason::LimitPriceOutOfRange));
        }

        let currency = self.currency_of(&symbol);
        let notional = fees::notional_in_settlement(qty, limit_price, fx_rate_to_chf(currency));
        if notional < min_order_amount {
            return Err(EngineError::reject(RejectReason::BelowMinimumAmount));
        }

        let now = self.current_time;
        let mut reserved = Money::zero();
        let mut reserved_avg_cost = None;
        match side {
            Side::Buy => {
                let fee = fees::fee_for_notional(notional, fee_bps, fee_cap);
                reserved = notional.add(fee);
                let player = self
                    .players
                    .get_mut(&(game_id, user_id))
                    .ok_or(EngineError::PlayerNotFound(game_id, user_id))?;
                if !player.try_reserve(reserved) {
                    return Err(EngineError::reject(RejectReason::InsufficientCash));
                }
            }
            Side::Sell => {
                // escrow the shares now, so the same lot cannot back two orders
                let key = (game_id, user_id, symbol.clone());
                let position = self
                    .positions
                    .get_mut(&key)
                    .ok_or(EngineError::reject(RejectReason::InsufficientPosition))?;
                if !position.try_reduce(qty, now) {
                    return Err(EngineError::reject(RejectReason::InsufficientPosition));
                }
                reserved_avg_cost = Some(position.avg_cost);
                if position.is_empty() {
                    self.positions.remove(&key);
                }
            }
        }

        let id = self.next_order_id();
        let mut order =
            PendingOrder::new(id, game_id, user_id, symbol.clone(), side, qty, limit_price, now);
        order.reserved_avg_cost = reserved_avg_cost;
        self.pending.insert(id, order);

        self.emit_event(EventPayload::LimitOrderPlaced(LimitOrderPlacedEvent {
            game_id,
            user_id,
            order_id: id,
            symbol,
            side,
            qty,
            limit_price,
            reserved,
        }));

        Ok(id)
    }

    /// Cancel a resting order. Only the owner may cancel; a buy order's
    /// reservation returns to spendable cash.
    pub fn cancel_order(&mut self, order_id: OrderId, user_id: UserId) -> Result<(), EngineError> {
        let now = self.current_time;
        let order = self
            .pending
            .get_mut(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(EngineError::NotOrderOwner(order_id));
        }
        if !order.try_transition(OrderStatus::Cancelled, now) {
            return Err(EngineError::OrderNotOpen(order_id));
        }

        let game_id = order.game_id;
        let symbol = order.symbol.clone();
        let side = order.side;
        let qty = order.qty;
        let limit_price = order.limit_price;
        let reserved_avg_cost = order.reserved_avg_cost;

        match side {
            Side::Buy => {
                self.release_buy_reservation(game_id, user_id, &symbol, qty, limit_price);
            }
            Side::Sell => {
                self.restore_sell_escrow(game_id, user_id, &symbol, qty, reserved_avg_cost);
            }
        }

        self.emit_event(EventPayload::OrderClosed(OrderClosedEvent {
            game_id,
            user_id,
            order_id,
            reason: CloseReason::UserCancelled,
        }));
        Ok(())
    }

    // Shared placement checks: active game, known player, sane quantity.
    // Returns the game's fee schedule for the caller.
    fn validate_order_basics(
        &self,
        game_id: GameId,
        user_id: UserId,
        qty: Decimal,
    ) -> Result<(crate::types::Bps, Money, Money), EngineError> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        if !game.is_effectively_active(self.current_time) {
            return Err(EngineError::reject(RejectReason::GameNotActive));
        }
        if !self.players.contains_key(&(game_id, user_id)) {
            return Err(EngineError::PlayerNotFound(game_id, user_id));
        }
        if qty <= Decimal::ZERO {
            return Err(EngineError::reject(RejectReason::InvalidQuantity));
        }
        if !game.allow_fractional && qty.fract() != Decimal::ZERO {
            return Err(EngineError::reject(RejectReason::WholeSharesRequired));
        }
        Ok((game.fee_bps, game.fee_cap, game.min_order_amount))
    }

    pub(super) fn currency_of(&self, symbol: &Symbol) -> Currency {
        self.refdata
            .instrument(symbol)
            .map(|i| i.currency)
            .unwrap_or_else(|| currency_for_symbol(symbol))
    }

    /// The settlement amount a resting buy order holds in reservation.
    /// Recomputed from the order's own terms, so placement, fill, and refund
    /// always agree on the figure.
    pub(super) fn buy_reservation_amount(
        &self,
        game_id: GameId,
        symbol: &Symbol,
        qty: Decimal,
        limit_price: Price,
    ) -> Money {
        let currency = self.currency_of(symbol);
        let notional = fees::notional_in_settlement(qty, limit_price, fx_rate_to_chf(currency));
        let (fee_bps, fee_cap) = match self.games.get(&game_id) {
            Some(game) => (game.fee_bps, game.fee_cap),
            None => return notional,
        };
        let fee = fees::fee_for_notional(notional, fee_bps, fee_cap);
        notional.add(fee)
    }

    pub(super) fn release_buy_reservation(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        symbol: &Symbol,
        qty: Decimal,
        limit_price: Price,
    ) {
        let amount = self.buy_reservation_amount(game_id, symbol, qty, limit_price);
        if let Some(player) = self.players.get_mut(&(game_id, user_id)) {
            let refund = Money::new(amount.value().min(player.reserved.value()));
            player.release_reservation(refund);
        }
    }

    /// Return escrowed shares to the position at the cost basis they left
    /// with. Reopens the position when the escrow consumed the last lot.
    pub(super) fn restore_sell_escrow(
        &mut self,
        game_id: GameId,
        user_id: UserId,
        symbol: &Symbol,
        qty: Decimal,
        reserved_avg_cost: Option<Price>,
    ) {
        let now = self.current_time;
        let cost = match reserved_avg_cost {
            Some(cost) => cost,
            None => return,
        };
        self.positions
            .entry((game_id, user_id, symbol.clone()))
            .and_modify(|p| p.apply_buy(qty, cost, now))
            .or_insert_with(|| Position::open(game_id, user_id, symbol.clone(), qty, cost, now));
    }
}
