//! Fixed-rate loan sizing and amortization.
//!
//! The monthly payment follows the standard annuity formula
//!
//! ```text
//! payment = L × r × (1 + r)^n / ((1 + r)^n − 1)
//! ```
//!
//! with `r` the monthly rate and `n` the number of monthly payments. Three
//! degenerate inputs are handled explicitly so the result is always a number:
//!
//! | Input              | Payment |
//! |--------------------|---------|
//! | rate = 0           | `L / n` |
//! | term = 0           | 0 (no amortizing loan) |
//! | formula overflows  | `L × r`, the formula's limit |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use deal_core::calculations::FinancingModel;
//! use deal_core::calculations::common::round_half_up;
//!
//! let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 30);
//!
//! assert_eq!(loan.loan_amount, dec!(400000));
//! assert_eq!(round_half_up(loan.monthly_payment), dec!(2661.21));
//! ```

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use super::common::MONTHS_PER_YEAR;

/// Loan figures derived from an offer price and financing terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_amount: Decimal,
    pub annual_rate: Decimal,
    pub term_years: u32,
    pub monthly_payment: Decimal,
    pub annual_debt_service: Decimal,
}

impl LoanTerms {
    pub fn payment_count(&self) -> u32 {
        self.term_years.saturating_mul(12)
    }

    /// Period-by-period split of each payment into interest and principal.
    pub fn schedule(&self) -> AmortizationSchedule {
        AmortizationSchedule {
            balance: self.loan_amount,
            monthly_rate: self.annual_rate / MONTHS_PER_YEAR,
            payment: self.monthly_payment,
            period: 0,
            periods: self.payment_count(),
        }
    }
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    /// 1-based payment number.
    pub period: u32,
    pub interest: Decimal,
    pub principal: Decimal,
    pub balance: Decimal,
}

/// Iterator over the payments of a [`LoanTerms`].
#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    balance: Decimal,
    monthly_rate: Decimal,
    payment: Decimal,
    period: u32,
    periods: u32,
}

impl Iterator for AmortizationSchedule {
    type Item = AmortizationPeriod;

    fn next(&mut self) -> Option<Self::Item> {
        if self.period >= self.periods {
            return None;
        }
        self.period += 1;

        let interest = self.balance.saturating_mul(self.monthly_rate);
        let principal = self.payment.saturating_sub(interest);
        self.balance = self.balance.saturating_sub(principal);

        Some(AmortizationPeriod {
            period: self.period,
            interest,
            principal,
            balance: self.balance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.periods - self.period) as usize;
        (remaining, Some(remaining))
    }
}

pub struct FinancingModel;

impl FinancingModel {
    /// Sizes the loan and computes its level monthly payment.
    pub fn amortize(
        offer_price: Decimal,
        down_payment_fraction: Decimal,
        annual_rate: Decimal,
        term_years: u32,
    ) -> LoanTerms {
        let loan_amount =
            offer_price.saturating_mul(Decimal::ONE.saturating_sub(down_payment_fraction));
        let monthly_payment = Self::monthly_payment(loan_amount, annual_rate, term_years);

        LoanTerms {
            loan_amount,
            annual_rate,
            term_years,
            monthly_payment,
            annual_debt_service: monthly_payment.saturating_mul(MONTHS_PER_YEAR),
        }
    }

    /// Level monthly payment for a fully amortizing loan.
    pub fn monthly_payment(
        loan_amount: Decimal,
        annual_rate: Decimal,
        term_years: u32,
    ) -> Decimal {
        let payments = u64::from(term_years) * 12;
        if payments == 0 {
            return Decimal::ZERO;
        }

        let r = annual_rate / MONTHS_PER_YEAR;
        if r.is_zero() {
            return loan_amount / Decimal::from(payments);
        }

        let interest_only = loan_amount.saturating_mul(r);
        let Some(growth) = Decimal::ONE
            .checked_add(r)
            .and_then(|base| base.checked_powu(payments))
        else {
            return interest_only;
        };
        if growth == Decimal::ONE {
            return loan_amount / Decimal::from(payments);
        }

        // (1+r)^n / ((1+r)^n - 1) tends to 1, so it is applied last.
        growth
            .checked_sub(Decimal::ONE)
            .and_then(|excess| growth.checked_div(excess))
            .and_then(|factor| loan_amount.checked_mul(r)?.checked_mul(factor))
            .unwrap_or(interest_only)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::common::round_half_up;

    // =========================================================================
    // amortize tests
    // =========================================================================

    #[test]
    fn amortize_thirty_year_loan_at_seven_percent() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 30);

        assert_eq!(loan.loan_amount, dec!(400000));
        assert_eq!(round_half_up(loan.monthly_payment), dec!(2661.21));
        assert_eq!(round_half_up(loan.annual_debt_service), dec!(31934.56));
    }

    #[test]
    fn amortize_fifteen_year_loan() {
        let loan = FinancingModel::amortize(dec!(250000), dec!(0.20), dec!(0.06), 15);

        // 200,000 at 6% over 180 months
        assert_eq!(round_half_up(loan.monthly_payment), dec!(1687.71));
    }

    #[test]
    fn zero_rate_divides_loan_evenly() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), Decimal::ZERO, 30);

        assert_eq!(round_half_up(loan.monthly_payment), dec!(1111.11));
        assert_eq!(round_half_up(loan.annual_debt_service), dec!(13333.33));
    }

    #[test]
    fn zero_term_has_no_payment() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 0);

        assert_eq!(loan.monthly_payment, Decimal::ZERO);
        assert_eq!(loan.annual_debt_service, Decimal::ZERO);
    }

    #[test]
    fn full_down_payment_means_no_loan() {
        let loan = FinancingModel::amortize(dec!(500000), Decimal::ONE, dec!(0.07), 30);

        assert_eq!(loan.loan_amount, Decimal::ZERO);
        assert_eq!(loan.monthly_payment, Decimal::ZERO);
    }

    #[test]
    fn extreme_rate_does_not_panic() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(1000), 40);

        assert!(loan.monthly_payment > Decimal::ZERO);
    }

    #[test]
    fn large_representable_growth_tends_to_interest_only() {
        // 100% a month for 84 months: (1 + r)^n fits in a Decimal but
        // L × r × (1 + r)^n does not.
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(12), 7);

        assert_eq!(round_half_up(loan.monthly_payment), dec!(400000));
        assert_eq!(round_half_up(loan.annual_debt_service), dec!(4800000));
    }

    #[test]
    fn huge_loan_saturates_instead_of_panicking() {
        let loan = FinancingModel::amortize(Decimal::MAX, dec!(-1), dec!(0.07), 30);

        assert_eq!(loan.loan_amount, Decimal::MAX);
        assert!(loan.monthly_payment > Decimal::ZERO);
        assert_eq!(loan.schedule().count(), 360);
    }

    // =========================================================================
    // schedule tests
    // =========================================================================

    #[test]
    fn schedule_has_one_row_per_payment() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 30);

        assert_eq!(loan.schedule().count(), 360);
    }

    #[test]
    fn first_period_splits_interest_and_principal() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 30);

        let first = loan.schedule().next().unwrap();

        assert_eq!(first.period, 1);
        assert_eq!(round_half_up(first.interest), dec!(2333.33));
        assert_eq!(round_half_up(first.principal), dec!(327.88));
    }

    #[test]
    fn schedule_retires_the_loan() {
        let loan = FinancingModel::amortize(dec!(500000), dec!(0.20), dec!(0.07), 30);

        let principal: Decimal = loan.schedule().map(|row| row.principal).sum();
        let last = loan.schedule().last().unwrap();

        assert!((principal - loan.loan_amount).abs() < dec!(0.01));
        assert!(last.balance.abs() < dec!(0.01));
    }

    #[test]
    fn zero_rate_schedule_retires_the_loan() {
        let loan = FinancingModel::amortize(dec!(120000), Decimal::ZERO, Decimal::ZERO, 10);

        let last = loan.schedule().last().unwrap();

        assert!(last.balance.abs() < dec!(0.01));
    }
}
