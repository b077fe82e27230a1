//! Settlement tests: cash conservation, reservation symmetry, fee arithmetic,
//! and the at-most-once fill guarantee under redundant sweeps.

use rust_decimal_macros::dec;
use tradesim_core::*;

// a Tuesday, 10:00 UTC: European venues open, New York closed.
const TS: i64 = 1_704_189_600_000;

fn refdata() -> RefData {
    let mut refdata = RefData::new();
    refdata.add_instrument(instrument("NESN.SW", "Nestlé", Price::new(dec!(90))));
    refdata.add_instrument(instrument("ROG.SW", "Roche", Price::new(dec!(250))));
    refdata.add_instrument(instrument("AAPL", "Apple", None));
    refdata
}

fn engine_with(config: EngineConfig) -> Engine {
    let mut engine = Engine::new(config, refdata());
    engine.set_time(Timestamp::from_millis(TS));
    engine.seed_reference_prices();
    engine
}

fn zero_spread() -> EngineConfig {
    EngineConfig {
        spread_pct: dec!(0),
        ..EngineConfig::default()
    }
}

fn joined_game(engine: &mut Engine) -> GameId {
    let game = engine.create_game(GameParams::default());
    engine.join_game(game, UserId(1), "alice").unwrap();
    game
}

/// The worked scenario: fee 10 bps, USD at 0.88, buy 10 @ 50.00 through a
/// resting limit. Debit is 440.44 CHF exactly; the fill consumes the
/// reservation without touching spendable cash again.
#[test]
fn usd_limit_buy_worked_example() {
    let mut engine = engine_with(EngineConfig::default());
    let game = joined_game(&mut engine);

    // AAPL is live-quoted; park the feed at 50.00 while New York is closed so
    // the board price passes through untouched
    let mut feed = MockQuoteFeed::new("mock");
    feed.set_price(Symbol::from("AAPL"), dec!(50));
    engine.refresh_live_quotes(&feed);

    let order_id = engine
        .place_limit_order(
            game,
            UserId(1),
            Symbol::from("AAPL"),
            Side::Buy,
            dec!(10),
            Price::new_unchecked(dec!(50)),
        )
        .unwrap();

    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(99559.56));
    assert_eq!(player.reserved.value(), dec!(440.44));

    let result = engine.match_open_orders();
    assert_eq!(result.filled, 1);

    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(99559.56));
    assert_eq!(player.reserved.value(), dec!(0));

    let position = engine.position(game, UserId(1), &Symbol::from("AAPL")).unwrap();
    assert_eq!(position.qty, dec!(10));
    assert_eq!(position.avg_cost.value(), dec!(50));

    let order = engine.pending_order(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.fill_price.map(|p| p.value()), Some(dec!(50)));
    assert_eq!(order.fee.map(|f| f.value()), Some(dec!(0.44)));
}

#[test]
fn redundant_sweeps_fill_at_most_once() {
    let mut engine = engine_with(EngineConfig::default());
    let game = joined_game(&mut engine);

    let mut feed = MockQuoteFeed::new("mock");
    feed.set_price(Symbol::from("AAPL"), dec!(50));
    engine.refresh_live_quotes(&feed);

    engine
        .place_limit_order(
            game,
            UserId(1),
            Symbol::from("AAPL"),
            Side::Buy,
            dec!(10),
            Price::new_unchecked(dec!(50)),
        )
        .unwrap();

    assert_eq!(engine.match_open_orders().filled, 1);
    let cash_after_fill = engine.player(game, UserId(1)).unwrap().cash;

    // a second and third sweep find nothing open and change nothing
    let rerun = engine.match_open_orders();
    assert_eq!(rerun.scanned, 0);
    assert_eq!(rerun.filled, 0);
    engine.match_open_orders();

    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash, cash_after_fill);
    assert_eq!(player.reserved.value(), dec!(0));
    assert_eq!(engine.position(game, UserId(1), &Symbol::from("AAPL")).unwrap().qty, dec!(10));
}

#[test]
fn market_buy_and_sell_conserve_cash_modulo_fees() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);

    // seed price 90 CHF, zero spread, same minute: execution at exactly 90
    let trade = engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(10))
        .unwrap();
    assert_eq!(trade.price.value(), dec!(90));
    assert_eq!(trade.notional.value(), dec!(900));
    assert_eq!(trade.fee.value(), dec!(0.90));
    assert_eq!(trade.new_cash.value(), dec!(99099.10));

    let trade = engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Sell, dec!(10))
        .unwrap();
    assert_eq!(trade.fee.value(), dec!(0.90));

    // round trip at an unchanged price loses exactly the two fees
    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(100_000) - dec!(1.80));
    assert!(engine.position(game, UserId(1), &Symbol::from("NESN.SW")).is_none());
}

#[test]
fn fee_is_capped_per_trade() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);

    // 300 * 90 = 27,000 CHF; 10 bps would be 27.00, the cap holds it at 15
    let trade = engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(300))
        .unwrap();
    assert_eq!(trade.fee.value(), dec!(15));
    assert_eq!(trade.new_cash.value(), dec!(100_000) - dec!(27_015));
}

#[test]
fn buy_reservation_round_trips_through_cancellation() {
    let mut engine = engine_with(EngineConfig::default());
    let game = joined_game(&mut engine);

    let market = engine.current_price(&Symbol::from("ROG.SW")).unwrap();
    let limit = Price::new_unchecked(
        (market.value() * dec!(0.95)).round_dp(4),
    );
    let order_id = engine
        .place_limit_order(game, UserId(1), Symbol::from("ROG.SW"), Side::Buy, dec!(7), limit)
        .unwrap();

    let player = engine.player(game, UserId(1)).unwrap();
    assert!(player.reserved.value() > dec!(0));
    assert!(player.cash.value() < dec!(100_000));

    engine.cancel_order(order_id, UserId(1)).unwrap();
    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(100_000));
    assert_eq!(player.reserved.value(), dec!(0));
}

#[test]
fn sell_escrow_round_trips_through_cancellation() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);
    let symbol = Symbol::from("NESN.SW");

    engine
        .place_market_order(game, UserId(1), symbol.clone(), Side::Buy, dec!(20))
        .unwrap();
    let before = engine.position(game, UserId(1), &symbol).unwrap().clone();

    let market = engine.current_price(&symbol).unwrap();
    let limit = Price::new_unchecked((market.value() * dec!(1.05)).round_dp(4));
    let order_id = engine
        .place_limit_order(game, UserId(1), symbol.clone(), Side::Sell, dec!(20), limit)
        .unwrap();

    // the whole lot is escrowed: the position row is gone and cannot back a
    // second sell
    assert!(engine.position(game, UserId(1), &symbol).is_none());
    let oversell = engine.place_market_order(game, UserId(1), symbol.clone(), Side::Sell, dec!(1));
    assert!(matches!(
        oversell,
        Err(EngineError::Rejected(RejectReason::InsufficientPosition))
    ));

    engine.cancel_order(order_id, UserId(1)).unwrap();
    let restored = engine.position(game, UserId(1), &symbol).unwrap();
    assert_eq!(restored.qty, before.qty);
    assert_eq!(restored.avg_cost, before.avg_cost);
}

#[test]
fn expiry_sweep_refunds_reservations() {
    let mut engine = engine_with(EngineConfig::default());
    let params = GameParams {
        duration_minutes: 30,
        ..GameParams::default()
    };
    let game = engine.create_game(params);
    engine.join_game(game, UserId(1), "alice").unwrap();

    let market = engine.current_price(&Symbol::from("NESN.SW")).unwrap();
    let limit = Price::new_unchecked((market.value() * dec!(0.92)).round_dp(4));
    engine
        .place_limit_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(5), limit)
        .unwrap();

    engine.advance_time(60 * 60_000);
    let result = engine.tick();
    assert_eq!(result.expired, 1);
    assert_eq!(result.filled, 0);

    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(100_000));
    assert_eq!(player.reserved.value(), dec!(0));
}

#[test]
fn trading_rejections_leave_state_unmodified() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);
    let symbol = Symbol::from("NESN.SW");

    // zero and negative quantity
    for qty in [dec!(0), dec!(-3)] {
        let result = engine.place_market_order(game, UserId(1), symbol.clone(), Side::Buy, qty);
        assert!(matches!(
            result,
            Err(EngineError::Rejected(RejectReason::InvalidQuantity))
        ));
    }

    // cash cannot cover: 2000 * 90 = 180,000 CHF
    let result = engine.place_market_order(game, UserId(1), symbol.clone(), Side::Buy, dec!(2000));
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::InsufficientCash))
    ));

    // selling without a position
    let result = engine.place_market_order(game, UserId(1), symbol.clone(), Side::Sell, dec!(1));
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::InsufficientPosition))
    ));

    // limit too far from market
    let result = engine.place_limit_order(
        game,
        UserId(1),
        symbol.clone(),
        Side::Buy,
        dec!(1),
        Price::new_unchecked(dec!(50)),
    );
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::LimitPriceOutOfRange))
    ));

    let player = engine.player(game, UserId(1)).unwrap();
    assert_eq!(player.cash.value(), dec!(100_000));
    assert_eq!(player.reserved.value(), dec!(0));
    assert_eq!(engine.open_order_count(), 0);
}

#[test]
fn whole_share_games_reject_fractions() {
    let mut engine = engine_with(zero_spread());
    let params = GameParams {
        allow_fractional: false,
        ..GameParams::default()
    };
    let game = engine.create_game(params);
    engine.join_game(game, UserId(1), "alice").unwrap();

    let result = engine.place_market_order(
        game,
        UserId(1),
        Symbol::from("NESN.SW"),
        Side::Buy,
        dec!(1.5),
    );
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::WholeSharesRequired))
    ));

    engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(2))
        .unwrap();
}

#[test]
fn minimum_order_amount_enforced() {
    let mut engine = engine_with(zero_spread());
    let params = GameParams {
        min_order_amount: Money::new(dec!(100)),
        ..GameParams::default()
    };
    let game = engine.create_game(params);
    engine.join_game(game, UserId(1), "alice").unwrap();

    // 1 * 90 CHF < 100 CHF minimum
    let result = engine.place_market_order(
        game,
        UserId(1),
        Symbol::from("NESN.SW"),
        Side::Buy,
        dec!(1),
    );
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::BelowMinimumAmount))
    ));

    engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(2))
        .unwrap();
}

#[test]
fn cancel_is_owner_only_and_single_shot() {
    let mut engine = engine_with(EngineConfig::default());
    let game = joined_game(&mut engine);
    engine.join_game(game, UserId(2), "bob").unwrap();

    let market = engine.current_price(&Symbol::from("NESN.SW")).unwrap();
    let limit = Price::new_unchecked((market.value() * dec!(0.95)).round_dp(4));
    let order_id = engine
        .place_limit_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(3), limit)
        .unwrap();

    assert!(matches!(
        engine.cancel_order(order_id, UserId(2)),
        Err(EngineError::NotOrderOwner(_))
    ));
    engine.cancel_order(order_id, UserId(1)).unwrap();
    assert!(matches!(
        engine.cancel_order(order_id, UserId(1)),
        Err(EngineError::OrderNotOpen(_))
    ));
}

#[test]
fn finished_game_rejects_new_orders() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);
    engine.finish_game(game).unwrap();

    let result = engine.place_market_order(
        game,
        UserId(1),
        Symbol::from("NESN.SW"),
        Side::Buy,
        dec!(1),
    );
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::GameNotActive))
    ));
}

#[test]
fn snapshots_track_total_value_through_a_trade() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);

    let point = engine.record_equity_snapshot(game, UserId(1)).unwrap();
    assert_eq!(point.total.value(), dec!(100_000));

    engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(10))
        .unwrap();

    // same minute, same price: only the fee left the account
    let history = engine.equity_history(game, UserId(1));
    let last = history.last().unwrap();
    assert_eq!(last.total.value(), dec!(100_000) - dec!(0.90));
    assert_eq!(last.positions_value.value(), dec!(900));
}

#[test]
fn leaderboard_counts_reservations_and_escrow() {
    let mut engine = engine_with(zero_spread());
    let game = joined_game(&mut engine);
    engine.join_game(game, UserId(2), "bob").unwrap();

    // alice rests a buy limit (cash reservation), bob escrows a sell limit
    let market = engine.current_price(&Symbol::from("NESN.SW")).unwrap();
    let low = Price::new_unchecked((market.value() * dec!(0.95)).round_dp(4));
    let high = Price::new_unchecked((market.value() * dec!(1.05)).round_dp(4));
    engine
        .place_limit_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(10), low)
        .unwrap();
    engine
        .place_market_order(game, UserId(2), Symbol::from("NESN.SW"), Side::Buy, dec!(10))
        .unwrap();
    engine
        .place_limit_order(game, UserId(2), Symbol::from("NESN.SW"), Side::Sell, dec!(10), high)
        .unwrap();

    let board = engine.leaderboard(game);
    assert_eq!(board.len(), 2);
    let alice = board.iter().find(|e| e.user_id == UserId(1)).unwrap();
    let bob = board.iter().find(|e| e.user_id == UserId(2)).unwrap();

    // alice has traded nothing: her total is the full stake
    assert_eq!(alice.total_value.value(), dec!(100_000));
    // bob paid one fee; his escrowed shares still count at market value
    assert_eq!(bob.total_value.value(), dec!(100_000) - dec!(0.90));
}
