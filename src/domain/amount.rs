use crate::error::AmountError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Where the token's decimal-place count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalsSource {
    /// A protocol constant known ahead of time.
    Fixed(u32),
    /// Read `decimals()` from the token contract once per batch.
    FromContract,
}

/// Splits `-?digits[.digits]` into sign, whole and fraction parts, with at
/// least one digit on either side of the point.
fn split_plain_decimal(s: &str) -> Option<(bool, &str, &str)> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return None;
    }
    Some((negative, whole, fraction))
}

/// Parses a plain decimal amount. Signs other than a leading `-`, digit
/// separators and exponents are rejected.
pub fn parse_amount(amount: &str) -> Result<Decimal, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    let invalid = || AmountError::Invalid(trimmed.to_string());
    let (negative, whole, fraction) = split_plain_decimal(trimmed).ok_or_else(invalid)?;

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };
    let value = Decimal::from_str(&normalized)
        .map_err(|_| AmountError::Overflow(trimmed.to_string()))?;
    if negative && !value.is_zero() {
        return Err(AmountError::Negative(trimmed.to_string()));
    }
    Ok(value)
}

/// Converts a human decimal amount (e.g. `"1.5"`) into the token's smallest
/// integer unit.
///
/// Fractional digits beyond `decimals` are rounded half away from zero.
/// Scaled values above `Decimal::MAX` (about 7.9e28 base units) are reported
/// as [`AmountError::Overflow`].
pub fn to_base_units(amount: &str, decimals: u32) -> Result<u128, AmountError> {
    let value = parse_amount(amount)?;
    let overflow = || AmountError::Overflow(amount.trim().to_string());

    let mut factor = Decimal::ONE;
    for _ in 0..decimals {
        factor = factor.checked_mul(Decimal::TEN).ok_or_else(overflow)?;
    }

    value
        .checked_mul(factor)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|units| units.to_u128())
        .ok_or_else(overflow)
}
