//! Conversions between minor currency units (cents) and major units (dollars).
//!
//! Minor units are stored as `i64`. Major units are `Decimal` so that fee
//! arithmetic never goes through binary floating point.

use crate::error::CoreError;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Number of decimal places between a minor and a major unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Converts an amount in minor units into major units. `10000` becomes `100.00`.
pub fn minor_to_major(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Converts a fractional minor-unit figure (e.g. an average) into major units.
pub fn minor_decimal_to_major(minor: Decimal) -> Decimal {
    minor / Decimal::ONE_HUNDRED
}

/// Re-quantizes a major-unit amount to the nearest whole minor unit.
///
/// Midpoints round away from zero, so `0.005` becomes `1` and `-0.005` becomes `-1`.
pub fn major_to_minor(major: Decimal) -> Result<i64, CoreError> {
    major
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or_else(|| {
            CoreError::Calculation(format!("{major} does not fit into a minor-unit amount"))
        })
}

/// Divides two amounts, defining a zero denominator as a zero result.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_units_become_dollars() {
        assert_eq!(minor_to_major(10000), dec!(100.00));
        assert_eq!(minor_to_major(9410), dec!(94.10));
        assert_eq!(minor_to_major(-5), dec!(-0.05));
    }

    #[test]
    fn quantizing_rounds_to_nearest_cent() {
        assert_eq!(major_to_minor(dec!(94.10)).unwrap(), 9410);
        assert_eq!(major_to_minor(dec!(1.234)).unwrap(), 123);
        assert_eq!(major_to_minor(dec!(1.236)).unwrap(), 124);
        assert_eq!(major_to_minor(dec!(0.005)).unwrap(), 1);
        assert_eq!(major_to_minor(dec!(-0.005)).unwrap(), -1);
    }

    #[test]
    fn quantizing_overflow_is_an_error() {
        assert!(major_to_minor(Decimal::MAX).is_err());
    }

    #[test]
    fn zero_denominator_yields_zero() {
        assert_eq!(ratio_or_zero(dec!(50), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(50), dec!(200)), dec!(0.25));
    }
}
