// tradesim-core: paper-trading game engine.
// deterministic-first architecture: the price simulator and settlement math
// are pure functions of injected time, so every replay agrees.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: GameId, Symbol, Side, Money, Price, Timestamp
//   2.x  instrument.rs: instrument reference data, sectors, currency rules
//   3.x  calendar.rs: exchange sessions, open/close clock
//   4.x  sim.rs: seeded minute-tick price simulator
//   5.x  game.rs: games, players, cash and reservations
//   6.x  position.rs: holdings and average cost
//   7.x  order.rs: order records, resting limit orders, bid/ask
//   8.x  fees.rs: commissions and currency conversion
//   9.x  events.rs: state transition events for audit
//   10.x price.rs: price board: latest rows + sampled history
//   11.x quotes.rs: live quote feed seam (mocked)
//   12.x engine/: core engine: games, pricing, orders, matching, snapshots

// market model
pub mod calendar;
pub mod instrument;
pub mod sim;
pub mod types;

// game state
pub mod game;
pub mod order;
pub mod position;

// settlement
pub mod fees;

// infrastructure
pub mod events;
pub mod price;
pub mod quotes;

// the engine itself
pub mod engine;

// re exports for convenience
pub use calendar::*;
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use game::*;
pub use instrument::*;
pub use order::*;
pub use position::*;
pub use price::*;
pub use quotes::*;
pub use types::*;
pub use sim::{
    advance, display_oscillation, is_simulated, next_price, to_decimal_price, SimParams,
};
