// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, symbols, money, basis points, timestamps. each is a newtype so the compiler
// catches type mixups (a GameId is never a UserId).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

// 1.1: ticker symbol, e.g. "NESN.SW". the suffix encodes the venue and currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Venue suffix including the dot ("NESN.SW" -> Some(".SW")).
    /// `BRK.B` is a US listing despite the dot.
    pub fn suffix(&self) -> Option<&str> {
        if self.0 == "BRK.B" {
            return None;
        }
        self.0.rfind('.').map(|i| &self.0[i..])
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Buy adds to a position, Sell reduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

// 1.2: instrument currencies. all cash is settled in CHF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Chf,
    Usd,
    Eur,
    Sek,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Chf => "CHF",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Sek => "SEK",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// 1.3: settlement-currency amount. cash balances, fees, valuations all use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn add(&self, other: Money) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Money) -> Self {
        Self(self.0 - other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, m| acc.add(m))
    }
}

// 1.4: price in instrument currency per unit. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.5: basis points. 100 bps = 1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bps(i32);

impl Bps {
    pub fn new(bps: i32) -> Self {
        Self(bps)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }
}

// 1.6: millisecond timestamp. the engine is driven by injected timestamps;
// Timestamp::now() is for callers at the process edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Epoch-minute bucket. The price simulator is seeded per (symbol, minute).
    pub fn minute_bucket(&self) -> i64 {
        self.0.div_euclid(60_000)
    }

    pub fn add_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + minutes * 60_000)
    }
}

/// Fixed exchange rate into CHF, the settlement currency. Approximate by design;
/// there is no live FX feed in the game.
pub fn fx_rate_to_chf(currency: Currency) -> Decimal {
    match currency {
        Currency::Chf => Decimal::ONE,
        Currency::Usd => dec!(0.88),
        Currency::Eur => dec!(0.94),
        Currency::Sek => dec!(0.083),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn symbol_suffix() {
        assert_eq!(Symbol::from("NESN.SW").suffix(), Some(".SW"));
        assert_eq!(Symbol::from("AAPL").suffix(), None);
        assert_eq!(Symbol::from("BRK.B").suffix(), None);
        assert_eq!(Symbol::from("ERIC-B.ST").suffix(), Some(".ST"));
    }

    #[test]
    fn minute_bucket_boundaries() {
        assert_eq!(Timestamp::from_millis(0).minute_bucket(), 0);
        assert_eq!(Timestamp::from_millis(59_999).minute_bucket(), 0);
        assert_eq!(Timestamp::from_millis(60_000).minute_bucket(), 1);
    }

    #[test]
    fn bps_conversion() {
        assert_eq!(Bps::new(100).as_fraction(), dec!(0.01));
        assert_eq!(Bps::new(10).as_fraction(), dec!(0.001));
    }

    #[test]
    fn money_ordering() {
        let a = Money::new(dec!(10));
        let b = Money::new(dec!(20));
        assert!(a < b);
        assert_eq!(a.add(b).value(), dec!(30));
    }

    #[test]
    fn fx_table() {
        assert_eq!(fx_rate_to_chf(Currency::Chf), Decimal::ONE);
        assert_eq!(fx_rate_to_chf(Currency::Usd), dec!(0.88));
    }
}
