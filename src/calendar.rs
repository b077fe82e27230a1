// 3.0: exchange calendar. pure function of wall-clock time and a static venue table.
// offsets are fixed UTC offsets; DST is ignored, same simplification as the simulator.

use crate::types::{Symbol, Timestamp};
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

// Serialize only: the table is compiled in, rows are only ever shipped out.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    /// Venue suffix, "" for the default US venue.
    pub suffix: &'static str,
    pub name: &'static str,
    /// Fixed offset from UTC in minutes.
    pub utc_offset_minutes: i32,
    /// Open/close as minutes since local midnight.
    pub open_minutes: u32,
    pub close_minutes: u32,
    /// Trading weekdays, 1 = Monday .. 7 = Sunday.
    pub weekdays: &'static [u32],
}

const WEEKDAYS_MON_FRI: &[u32] = &[1, 2, 3, 4, 5];

pub const EXCHANGES: &[Exchange] = &[
    Exchange {
        suffix: "",
        name: "NYSE / NASDAQ",
        utc_offset_minutes: -5 * 60,
        open_minutes: 9 * 60 + 30,
        close_minutes: 16 * 60,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".SW",
        name: "SIX Swiss",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".PA",
        name: "Euronext Paris",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".DE",
        name: "XETRA",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".AS",
        name: "Euronext Amsterdam",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".MI",
        name: "Borsa Italiana",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".MC",
        name: "BME Madrid",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".HE",
        name: "Nasdaq Helsinki",
        utc_offset_minutes: 2 * 60,
        open_minutes: 10 * 60,
        close_minutes: 18 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
    Exchange {
        suffix: ".ST",
        name: "Nasdaq Stockholm",
        utc_offset_minutes: 60,
        open_minutes: 9 * 60,
        close_minutes: 17 * 60 + 30,
        weekdays: WEEKDAYS_MON_FRI,
    },
];

/// Venue for a symbol. Unknown suffixes fall back to the US venue.
pub fn exchange_for_symbol(symbol: &Symbol) -> &'static Exchange {
    match symbol.suffix() {
        Some(suffix) => EXCHANGES
            .iter()
            .find(|e| e.suffix == suffix)
            .unwrap_or(&EXCHANGES[0]),
        None => &EXCHANGES[0],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketClock {
    pub open: bool,
    /// Minutes until the next open/close transition.
    pub minutes_to_next_event: i64,
}

/// Whether the venue is open at `now`, and how long until the next state change.
/// No error conditions and no side effects.
pub fn market_clock(exchange: &Exchange, now: Timestamp) -> MarketClock {
    let utc = DateTime::<Utc>::from_timestamp_millis(now.as_millis()).unwrap_or_default();
    let offset = FixedOffset::east_opt(exchange.utc_offset_minutes * 60)
        .unwrap_or_else(|| Utc.fix());
    let local = utc.with_timezone(&offset);

    let weekday = local.weekday().number_from_monday();
    let minute_of_day = (local.hour() * 60 + local.minute()) as i64;
    let open = exchange.open_minutes as i64;
    let close = exchange.close_minutes as i64;
    let trading_day = exchange.weekdays.contains(&weekday);

    if trading_day && minute_of_day >= open && minute_of_day < close {
        return MarketClock {
            open: true,
            minutes_to_next_event: close - minute_of_day,
        };
    }

    if trading_day && minute_of_day < open {
        return MarketClock {
            open: false,
            minutes_to_next_event: open - minute_of_day,
        };
    }

    // After close or weekend: walk to the next trading day's open.
    let mut minutes = 1440 - minute_of_day;
    for ahead in 1..=7 {
        let day = (weekday - 1 + ahead) % 7 + 1;
        if exchange.weekdays.contains(&day) {
            return MarketClock {
                open: false,
                minutes_to_next_event: minutes + open,
            };
        }
        minutes += 1440;
    }

    // Unreachable with a non-empty weekday set.
    MarketClock {
        open: false,
        minutes_to_next_event: minutes,
    }
}

/// Shorthand: clock for a symbol's home venue.
pub fn market_clock_for_symbol(symbol: &Symbol, now: Timestamp) -> MarketClock {
    market_clock(exchange_for_symbol(symbol), now)
}
