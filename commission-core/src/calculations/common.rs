//! Rounding and currency helpers shared by the calculator, aggregator and
//! exporter.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to the currency's minor unit (two places) using banker's rounding.
///
/// The result always carries exactly two decimal places, so equal amounts
/// render identically regardless of how they were computed.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::common::round_half_even;
///
/// assert_eq!(round_half_even(dec!(2.345)), dec!(2.34));
/// assert_eq!(round_half_even(dec!(2.355)), dec!(2.36));
/// assert_eq!(round_half_even(dec!(1000)).to_string(), "1000.00");
/// ```
pub fn round_half_even(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// Formats an amount as US dollars with thousands separators, e.g.
/// `$1,234.56`. Negative amounts render as `-$1,234.56`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::common::format_currency;
///
/// assert_eq!(format_currency(dec!(1234.56)), "$1,234.56");
/// assert_eq!(format_currency(dec!(12200)), "$12,200.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_half_even(value);
    let digits = rounded.abs().to_string();
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}
