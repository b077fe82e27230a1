// 12.4 engine/matching.rs: the limit-order sweep. runs after every price
// refresh, scans open orders oldest-first up to the batch size, and settles
// each one independently: one bad order never blocks the rest.
//
// fills always execute at the order's limit price. an order whose backing
// cash reservation has drifted away is cancelled in place of filling, with
// the reason on the close event.

use super::core::Engine;
use super::results::SweepResult;
use crate::events::{CloseReason, EventPayload, OrderClosedEvent, TradeEvent};
use crate::fees;
use crate::order::{OrderRecord, OrderStatus};
use crate::types::{fx_rate_to_chf, GameId, Money, OrderId, Price, Side, Symbol, UserId};
use rust_decimal::Decimal;

// The order fields the sweep needs, detached from the map so the engine can be
// mutated while processing.
struct SweepItem {
    id: OrderId,
    game_id: GameId,
    user_id: UserId,
    symbol: Symbol,
    side: Side,
    qty: Decimal,
    limit_price: Price,
    reserved_avg_cost: Option<Price>,
}

impl Engine {
    /// One matching sweep over the open orders. Expired games release their
    /// orders; live ones are checked against the current board price and
    /// filled at their limit when the price has crossed.
    pub fn match_open_orders(&mut self) -> SweepResult {
        let batch: Vec<SweepItem> = self
            .pending
            .values()
            .filter(|o| o.status == OrderStatus::Open)
            .take(self.config.sweep_batch_size)
            .map(|o| SweepItem {
                id: o.id,
                game_id: o.game_id,
                user_id: o.user_id,
                symbol: o.symbol.clone(),
                side: o.side,
                qty: o.qty,
                limit_price: o.limit_price,
                reserved_avg_cost: o.reserved_avg_cost,
            })
            .collect();

        let mut result = SweepResult::default();
        for item in batch {
            result.scanned += 1;

            let game_active = self
                .games
                .get(&item.game_id)
                .map(|g| g.is_effectively_active(self.current_time))
                .unwrap_or(false);
            if !game_active {
                if self.close_order(&item, OrderStatus::Expired, CloseReason::GameExpired) {
                    result.expired += 1;
                }
                continue;
            }

            // no price, no decision; the order stays open for the next sweep
            let market = match self.current_price(&item.symbol) {
                Some(price) => price,
                None => continue,
            };
            let crossed = self
                .pending
                .get(&item.id)
                .map(|o| o.should_fill(market))
                .unwrap_or(false);
            if !crossed {
                continue;
            }

            match item.side {
                Side::Buy => match self.fill_buy(&item) {
                    FillOutcome::Filled => result.filled += 1,
                    FillOutcome::Cancelled => result.cancelled += 1,
                },
                Side::Sell => match self.fill_sell(&item) {
                    FillOutcome::Filled => result.filled += 1,
                    FillOutcome::Cancelled => result.cancelled += 1,
                },
            }
        }
        result
    }

    // Consume the reservation made at placement and convert it into shares at
    // the limit price. A short reservation cancels the order instead.
    fn fill_buy(&mut self, item: &SweepItem) -> FillOutcome {
        let amount =
            self.buy_reservation_amount(item.game_id, &item.symbol, item.qty, item.limit_price);
        let currency = self.currency_of(&item.symbol);
        let notional =
            fees::notional_in_settlement(item.qty, item.limit_price, fx_rate_to_chf(currency));
        let fee = amount.sub(notional);

        let consumed = self
            .players
            .get_mut(&(item.game_id, item.user_id))
            .map(|p| p.try_consume_reservation(amount))
            .unwrap_or(false);
        if !consumed {
            let _ = self.close_order(item, OrderStatus::Cancelled, CloseReason::InsufficientFunds);
            return FillOutcome::Cancelled;
        }

        let now = self.current_time;
        let key = (item.game_id, item.user_id, item.symbol.clone());
        self.positions
            .entry(key)
            .and_modify(|p| p.apply_buy(item.qty, item.limit_price, now))
            .or_insert_with(|| {
                crate::position::Position::open(
                    item.game_id,
                    item.user_id,
                    item.symbol.clone(),
                    item.qty,
                    item.limit_price,
                    now,
                )
            });

        self.settle_fill(item, fee);
        FillOutcome::Filled
    }

    // The shares were escrowed at placement, so the fill only turns them into
    // proceeds: credit notional minus fee at the limit price.
    fn fill_sell(&mut self, item: &SweepItem) -> FillOutcome {
        let currency = self.currency_of(&item.symbol);
        let notional =
            fees::notional_in_settlement(item.qty, item.limit_price, fx_rate_to_chf(currency));
        let (fee_bps, fee_cap) = match self.games.get(&item.game_id) {
            Some(game) => (game.fee_bps, game.fee_cap),
            None => {
                let _ =
                    self.close_order(item, OrderStatus::Cancelled, CloseReason::InsufficientShares);
                return FillOutcome::Cancelled;
            }
        };
        let fee = fees::fee_for_notional(notional, fee_bps, fee_cap);

        if let Some(player) = self.players.get_mut(&(item.game_id, item.user_id)) {
            player.credit(notional.sub(fee));
        }

        self.settle_fill(item, fee);
        FillOutcome::Filled
    }

    // Common tail of a successful fill: close the order, record it, emit the
    // trade, snapshot equity.
    fn settle_fill(&mut self, item: &SweepItem, fee: Money) {
        let now = self.current_time;
        if let Some(order) = self.pending.get_mut(&item.id) {
            // the batch only held open orders, so this cannot fail mid-sweep
            let _ = order.try_transition(OrderStatus::Filled, now);
            order.fill_price = Some(item.limit_price);
            order.fee = Some(fee);
        }

        self.history.push(OrderRecord {
            game_id: item.game_id,
            user_id: item.user_id,
            symbol: item.symbol.clone(),
            side: item.side,
            qty: item.qty,
            price: item.limit_price,
            fee,
            executed_at: now,
        });

        self.emit_event(EventPayload::Trade(TradeEvent {
            game_id: item.game_id,
            user_id: item.user_id,
            symbol: item.symbol.clone(),
            side: item.side,
            qty: item.qty,
            price: item.limit_price,
            fee,
            from_limit: Some(item.id),
        }));
        self.emit_event(EventPayload::OrderClosed(OrderClosedEvent {
            game_id: item.game_id,
            user_id: item.user_id,
            order_id: item.id,
            reason: CloseReason::Filled,
        }));

        let _ = self.record_equity_snapshot(item.game_id, item.user_id);
    }

    // Terminal close without a fill: buy reservations refunded, sell escrow
    // restored. Returns false when the order already left `open`.
    fn close_order(&mut self, item: &SweepItem, status: OrderStatus, reason: CloseReason) -> bool {
        let now = self.current_time;
        let transitioned = self
            .pending
            .get_mut(&item.id)
            .map(|o| o.try_transition(status, now))
            .unwrap_or(false);
        if !transitioned {
            return false;
        }

        match item.side {
            Side::Buy if reason != CloseReason::InsufficientFunds => {
                self.release_buy_reservation(
                    item.game_id,
                    item.user_id,
                    &item.symbol,
                    item.qty,
                    item.limit_price,
                );
            }
            Side::Sell => {
                self.restore_sell_escrow(
                    item.game_id,
                    item.user_id,
                    &item.symbol,
                    item.qty,
                    item.reserved_avg_cost,
                );
            }
            _ => {}
        }

        self.emit_event(EventPayload::OrderClosed(OrderClosedEvent {
            game_id: item.game_id,
            user_id: item.user_id,
            order_id: item.id,
            reason,
        }));
        true
    }
}

enum FillOutcome {
    Filled,
    Cancelled,
}
