// 8.0: fee and currency-conversion arithmetic. fees are charged in the
// settlement currency on both buys (added to cost) and sells (taken from
// proceeds): min(cap, notional * bps / 10000), rounded to the cent.

use crate::types::{Bps, Currency, Money, Price};
use rust_decimal::{Decimal, RoundingStrategy};

/// Trade notional converted into the settlement currency.
pub fn notional_in_settlement(qty: Decimal, price: Price, fx_rate: Decimal) -> Money {
    Money::new(qty * price.value() * fx_rate)
}

/// Commission on a settlement-currency notional. Capped and rounded to
/// currency-minor-unit precision.
pub fn fee_for_notional(notional: Money, fee_bps: Bps, fee_cap: Money) -> Money {
    let raw = (notional.value() * fee_bps.as_fraction())
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Money::new(raw.min(fee_cap.value()))
}

/// Fee for a (qty, price, currency) trade; the common composition.
pub fn trade_fee(
    qty: Decimal,
    price: Price,
    currency: Currency,
    fee_bps: Bps,
    fee_cap: Money,
) -> Money {
    let notional = notional_in_settlement(qty, price, crate::types::fx_rate_to_chf(currency));
    fee_for_notional(notional, fee_bps, fee_cap)
}
