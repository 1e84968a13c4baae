//! Common helpers shared by the underwriting calculations.
//!
//! Calculations carry full `Decimal` precision; rounding to cents happens
//! only where a value is shown to a person.

use rust_decimal::Decimal;

/// Months in a year, as a `Decimal`.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use deal_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(2661.2130)), dec!(2661.21));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Adds up `values`, saturating at the bounds of `Decimal` instead of
/// panicking.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use deal_core::calculations::common::saturating_sum;
///
/// assert_eq!(saturating_sum([dec!(1.5), dec!(2.5)]), dec!(4.0));
/// assert_eq!(saturating_sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
/// ```
pub fn saturating_sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(value))
}

/// Divides `numerator` by `denominator`, or returns `None` when the
/// denominator is zero.
///
/// Ratios such as DSCR and cap rate have no meaningful value against a zero
/// base; `None` is the sentinel callers display instead of a number.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use deal_core::calculations::common::ratio;
///
/// assert_eq!(ratio(dec!(30000), dec!(500000)), Some(dec!(0.06)));
/// assert_eq!(ratio(dec!(30000), Decimal::ZERO), None);
/// ```
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(123.454));

        assert_eq!(result, dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(123.455));

        assert_eq!(result, dec!(123.46));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-123.455));

        assert_eq!(result, dec!(-123.46)); // Away from zero
    }

    #[test]
    fn round_half_up_handles_long_fractions() {
        let result = round_half_up(dec!(2661.2130386988801165));

        assert_eq!(result, dec!(2661.21));
    }

    #[test]
    fn round_half_up_handles_large_values() {
        let result = round_half_up(dec!(999999.999));

        assert_eq!(result, dec!(1000000.00));
    }

    // =========================================================================
    // ratio tests
    // =========================================================================

    #[test]
    fn ratio_divides_nonzero_denominator() {
        let result = ratio(dec!(27000), dec!(20000));

        assert_eq!(result, Some(dec!(1.35)));
    }

    #[test]
    fn ratio_returns_none_for_zero_denominator() {
        let result = ratio(dec!(27000), dec!(0.00));

        assert_eq!(result, None);
    }

    #[test]
    fn ratio_handles_negative_numerator() {
        let result = ratio(dec!(-5000), dec!(100000));

        assert_eq!(result, Some(dec!(-0.05)));
    }

    #[test]
    fn months_per_year_is_twelve() {
        assert_eq!(MONTHS_PER_YEAR, dec!(12));
    }
}
