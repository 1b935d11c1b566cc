//! Money helpers.
//!
//! All prices are `Decimal`. Rounding is to cents, half away from zero.

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Round a monetary value to cents.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a money cell from a table.
///
/// Accepts a leading `$` and thousands separators. Empty cells and
/// non-numeric text yield `None`.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// `percent` of `amount`, rounded to cents.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Format a price for trace text, e.g. `$12.34`.
pub fn format_money(value: Decimal) -> String {
    format!("${:.2}", round_money(value))
}
