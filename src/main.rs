//! Paper-trading game core simulation.
//!
//! Walks the engine through a full game lifecycle: seeded prices, market and
//! limit orders, the matching sweep, leaderboard, and game expiry.

use rust_decimal_macros::dec;
use tradesim_core::*;

// a Tuesday, 10:00 UTC: European venues are open.
const START_MS: i64 = 1_704_189_600_000;

fn main() {
    println!("Paper-Trading Game Core Simulation");
    println!("Deterministic Prices, Limit Matching, CHF Settlement\n");

    scenario_1_market_orders();
    scenario_2_limit_order_lifecycle();
    scenario_3_deterministic_replay();
    scenario_4_leaderboard();
    scenario_5_game_expiry();

    println!("\nAll simulations completed successfully.");
}

fn base_refdata() -> RefData {
    let mut refdata = RefData::new();
    refdata.add_instrument(instrument("NESN.SW", "Nestlé", Price::new(dec!(90))));
    refdata.add_instrument(instrument("ROG.SW", "Roche", Price::new(dec!(250))));
    refdata.add_instrument(instrument("NOVN.SW", "Novartis", Price::new(dec!(85))));
    refdata.add_instrument(instrument("OR.PA", "L'Oréal", Price::new(dec!(430))));
    refdata.add_instrument(instrument("AAPL", "Apple", None));
    refdata
}

fn base_engine() -> Engine {
    let mut engine = Engine::new(EngineConfig::default(), base_refdata());
    engine.set_time(Timestamp::from_millis(START_MS));
    engine.seed_reference_prices();
    engine
}

/// Market buy and sell with spread and fee.
fn scenario_1_market_orders() {
    println!("Scenario 1: Market Orders\n");

    let mut engine = base_engine();
    let game = engine.create_game(GameParams::default());
    engine.join_game(game, UserId(1), "alice").unwrap();

    let trade = engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(100))
        .unwrap();
    println!(
        "  Alice buys 100 NESN.SW @ {} (fee {} CHF), cash {}",
        trade.price, trade.fee, trade.new_cash
    );

    engine.advance_time(30 * 60_000);
    let trade = engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Sell, dec!(40))
        .unwrap();
    println!(
        "  30 minutes later she sells 40 @ {} (fee {} CHF), cash {}",
        trade.price, trade.fee, trade.new_cash
    );

    let portfolio = engine.portfolio(game, UserId(1)).unwrap();
    let position = &portfolio.positions[0];
    println!(
        "  Remaining position: {} {} @ avg {}\n",
        position.qty, position.symbol, position.avg_cost
    );
}

/// Limit order placement, reservation, and sweep fill.
fn scenario_2_limit_order_lifecycle() {
    println!("Scenario 2: Limit Order Lifecycle\n");

    let mut engine = base_engine();
    let game = engine.create_game(GameParams::default());
    engine.join_game(game, UserId(1), "alice").unwrap();

    let market = engine.current_price(&Symbol::from("ROG.SW")).unwrap();
    // bid 2% under the market; mean reversion and noise will cross it eventually
    let limit = Price::new_unchecked(market.value() * dec!(0.98));
    let order_id = engine
        .place_limit_order(game, UserId(1), Symbol::from("ROG.SW"), Side::Buy, dec!(10), limit)
        .unwrap();

    let player = engine.player(game, UserId(1)).unwrap();
    println!(
        "  Alice rests BUY 10 ROG.SW @ {} (market {}), reserved {} CHF",
        limit, market, player.reserved
    );

    let mut sweeps = 0;
    loop {
        engine.advance_time(5 * 60_000);
        let result = engine.tick();
        sweeps += 1;
        if result.filled > 0 {
            println!("  Filled after {} sweeps ({} minutes)", sweeps, sweeps * 5);
            break;
        }
        if sweeps >= 200 {
            println!("  Not crossed after {} sweeps; cancelling", sweeps);
            engine.cancel_order(order_id, UserId(1)).unwrap();
            break;
        }
    }

    let player = engine.player(game, UserId(1)).unwrap();
    println!(
        "  Cash {} / reserved {} after the order closed\n",
        player.cash, player.reserved
    );
}

/// Two engines fed the same clock produce identical prices.
fn scenario_3_deterministic_replay() {
    println!("Scenario 3: Deterministic Replay\n");

    let mut a = base_engine();
    let mut b = base_engine();
    for _ in 0..12 {
        a.advance_time(5 * 60_000);
        b.advance_time(5 * 60_000);
        a.refresh_simulated_prices();
        b.refresh_simulated_prices();
    }

    let symbol = Symbol::from("NOVN.SW");
    let pa = a.latest_tick(&symbol).unwrap().price;
    let pb = b.latest_tick(&symbol).unwrap().price;
    println!("  Engine A: NOVN.SW = {}", pa);
    println!("  Engine B: NOVN.SW = {}", pb);
    assert_eq!(pa, pb);
    println!("  Identical after an hour of independent replay\n");
}

/// Several players, ranked by total valuation.
fn scenario_4_leaderboard() {
    println!("Scenario 4: Leaderboard\n");

    let mut engine = base_engine();
    let game = engine.create_game(GameParams::default());
    engine.join_game(game, UserId(1), "alice").unwrap();
    engine.join_game(game, UserId(2), "bob").unwrap();
    engine.join_game(game, UserId(3), "carol").unwrap();

    engine
        .place_market_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(500))
        .unwrap();
    engine
        .place_market_order(game, UserId(2), Symbol::from("OR.PA"), Side::Buy, dec!(100))
        .unwrap();
    // carol stays in cash

    engine.advance_time(4 * 60 * 60_000);
    engine.tick();
    engine.record_game_snapshots(game);

    for (rank, entry) in engine.leaderboard(game).iter().enumerate() {
        println!(
            "  #{} {}: total {} CHF (pnl {} / {:.2}%)",
            rank + 1,
            entry.display_name,
            entry.total_value,
            entry.pnl,
            entry.pnl_pct
        );
    }
    println!();
}

/// Expiry releases resting orders and freezes trading.
fn scenario_5_game_expiry() {
    println!("Scenario 5: Game Expiry\n");

    let mut engine = base_engine();
    let params = GameParams {
        duration_minutes: 60,
        ..GameParams::default()
    };
    let game = engine.create_game(params);
    engine.join_game(game, UserId(1), "alice").unwrap();

    let market = engine.current_price(&Symbol::from("NESN.SW")).unwrap();
    let limit = Price::new_unchecked(market.value() * dec!(0.91));
    engine
        .place_limit_order(game, UserId(1), Symbol::from("NESN.SW"), Side::Buy, dec!(50), limit)
        .unwrap();
    println!(
        "  Alice rests a deep bid; reserved {} CHF",
        engine.player(game, UserId(1)).unwrap().reserved
    );

    engine.advance_time(2 * 60 * 60_000);
    let result = engine.tick();
    println!(
        "  Sweep after expiry: {} expired, {} filled",
        result.expired, result.filled
    );

    let player = engine.player(game, UserId(1)).unwrap();
    println!(
        "  Reservation refunded: cash {} / reserved {}",
        player.cash, player.reserved
    );

    let rejected = engine.place_market_order(
        game,
        UserId(1),
        Symbol::from("NESN.SW"),
        Side::Buy,
        dec!(1),
    );
    println!("  New order after expiry: {:?}", rejected.err().map(|e| e.to_string()));
}
