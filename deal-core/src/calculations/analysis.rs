//! End-to-end underwriting of one property under one override record.
//!
//! | Step | Component | Output |
//! |------|-----------|--------|
//! | 1 | [`IncomeAggregator`] | gross income, vacancy, effective gross income |
//! | 2 | [`ExpenseModel`] | ten-line expense breakdown |
//! | 3 | [`FinancingModel`] | loan amount, payment, debt service |
//! | 4 | [`ReturnCalculator`] | NOI, DSCR, cap rate, cash flow, returns |
//!
//! Every overridable input is taken from the override when present and from
//! the injected [`FinancingAssumptions`] otherwise. The interest rate default
//! depends on the effective loan term, so a term edit also moves the rate
//! unless the rate itself is overridden.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::expenses::{ExpenseBasis, ExpenseBreakdown, ExpenseModel, ExpensePolicy};
use super::financing::{FinancingModel, LoanTerms};
use super::income::{IncomeAggregator, IncomeSummary};
use super::rent::RentResolver;
use super::returns::{ReturnCalculator, ReturnInputs, ReturnMetrics};
use crate::models::{
    ExpenseLine, FinancingAssumptions, Property, PropertyOverride, RentTable, UnitMixEntry,
};

/// Financing inputs after the override has been laid over the assumptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTerms {
    pub offer_price: Decimal,
    pub unit_mix: Vec<UnitMixEntry>,
    pub vacancy_fraction: Decimal,
    pub down_payment_fraction: Decimal,
    pub interest_rate: Decimal,
    pub term_years: u32,
    pub closing_costs_fraction: Decimal,
    pub due_diligence_fraction: Decimal,
}

impl ResolvedTerms {
    pub fn resolve(
        property: &Property,
        overrides: &PropertyOverride,
        assumptions: &FinancingAssumptions,
    ) -> Self {
        let term_years = overrides.loan_term.unwrap_or(assumptions.term_years);

        Self {
            offer_price: overrides.offer_price.unwrap_or(property.list_price),
            unit_mix: overrides
                .unit_mix
                .clone()
                .unwrap_or_else(|| property.unit_mix.clone()),
            vacancy_fraction: overrides.vacancy.unwrap_or(assumptions.vacancy_fraction),
            down_payment_fraction: overrides
                .down_payment
                .unwrap_or(assumptions.down_payment_fraction),
            interest_rate: overrides
                .interest_rate
                .unwrap_or_else(|| assumptions.rate_for_term(term_years)),
            term_years,
            closing_costs_fraction: overrides
                .closing_costs
                .unwrap_or(assumptions.closing_costs_fraction),
            due_diligence_fraction: overrides
                .due_diligence
                .unwrap_or(assumptions.due_diligence_fraction),
        }
    }
}

/// Every figure shown for a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub terms: ResolvedTerms,
    pub income: IncomeSummary,
    pub expenses: ExpenseBreakdown,
    pub loan: LoanTerms,
    pub returns: ReturnMetrics,
}

/// Runs the full calculation pipeline against injected defaults.
#[derive(Debug, Clone, Copy)]
pub struct Underwriter<'a> {
    rent_table: &'a RentTable,
    assumptions: &'a FinancingAssumptions,
    policy: &'a ExpensePolicy,
}

impl<'a> Underwriter<'a> {
    pub fn new(
        rent_table: &'a RentTable,
        assumptions: &'a FinancingAssumptions,
        policy: &'a ExpensePolicy,
    ) -> Self {
        Self {
            rent_table,
            assumptions,
            policy,
        }
    }

    pub fn analyze(
        &self,
        property: &Property,
        overrides: &PropertyOverride,
    ) -> DealAnalysis {
        let terms = ResolvedTerms::resolve(property, overrides, self.assumptions);

        let income = IncomeAggregator::new(RentResolver::new(self.rent_table)).aggregate(
            property,
            &terms.unit_mix,
            terms.vacancy_fraction,
        );

        let expenses = ExpenseModel::new(self.policy).expenses(
            &self.expense_basis(property, &terms, &income),
            &overrides.opex,
        );

        let loan = FinancingModel::amortize(
            terms.offer_price,
            terms.down_payment_fraction,
            terms.interest_rate,
            terms.term_years,
        );

        let returns = ReturnCalculator::evaluate(&ReturnInputs {
            annual_gross_income: income.annual_gross_income,
            effective_gross_income: income.effective_gross_income,
            total_expenses: expenses.total,
            loan: &loan,
            offer_price: terms.offer_price,
            total_units: property.total_units,
            down_payment_fraction: terms.down_payment_fraction,
            closing_costs_fraction: terms.closing_costs_fraction,
            due_diligence_fraction: terms.due_diligence_fraction,
        });

        debug!(
            listing = %property.listing_id,
            noi = %returns.net_operating_income,
            monthly_cash_flow = %returns.monthly_cash_flow,
            "recomputed analysis"
        );

        DealAnalysis {
            terms,
            income,
            expenses,
            loan,
            returns,
        }
    }

    /// Default value of every expense line for the current state, used to
    /// seed an override before single-line edits.
    pub fn expense_defaults(
        &self,
        property: &Property,
        overrides: &PropertyOverride,
    ) -> BTreeMap<ExpenseLine, Decimal> {
        let terms = ResolvedTerms::resolve(property, overrides, self.assumptions);
        let income = IncomeAggregator::new(RentResolver::new(self.rent_table)).aggregate(
            property,
            &terms.unit_mix,
            terms.vacancy_fraction,
        );

        ExpenseModel::new(self.policy)
            .synthesize_defaults(&self.expense_basis(property, &terms, &income))
    }

    fn expense_basis<'p>(
        &self,
        property: &'p Property,
        terms: &ResolvedTerms,
        income: &IncomeSummary,
    ) -> ExpenseBasis<'p> {
        ExpenseBasis {
            property,
            offer_price: terms.offer_price,
            effective_gross_income: income.effective_gross_income,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::common::round_half_up;
    use crate::calculations::IncomeSource;
    use crate::models::MarketRentRow;

    fn test_table() -> RentTable {
        RentTable::from_rows([MarketRentRow::new("02124")
            .with_rent(1, dec!(1500))
            .with_rent(2, dec!(2000))
            .with_rent(3, dec!(2600))])
    }

    fn test_property() -> Property {
        let mut property = Property::custom("02124", dec!(500000), dec!(6000), 2);
        property.unit_mix = vec![UnitMixEntry::new(2, 2)];
        property.operating_expenses = Some(dec!(12000));
        property
    }

    // =========================================================================
    // analyze tests
    // =========================================================================

    #[test]
    fn analyze_reference_deal() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);

        let analysis = underwriter.analyze(&test_property(), &PropertyOverride::default());

        assert_eq!(analysis.income.annual_gross_income, dec!(48000));
        assert_eq!(analysis.income.effective_gross_income, dec!(46560));
        assert_eq!(analysis.expenses.total, dec!(18052.80));
        assert_eq!(analysis.loan.loan_amount, dec!(400000));
        assert_eq!(round_half_up(analysis.loan.monthly_payment), dec!(2661.21));
        assert_eq!(analysis.returns.net_operating_income, dec!(28507.20));
        assert_eq!(analysis.returns.equity_required, dec!(120000));
    }

    #[test]
    fn override_offer_price_drives_loan_and_equity() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let overrides = PropertyOverride::default().with_offer_price(dec!(400000));

        let analysis = underwriter.analyze(&test_property(), &overrides);

        assert_eq!(analysis.terms.offer_price, dec!(400000));
        assert_eq!(analysis.loan.loan_amount, dec!(320000));
        assert_eq!(analysis.returns.equity_required, dec!(96000));
    }

    #[test]
    fn override_unit_mix_replaces_listing_mix() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let overrides = PropertyOverride::default()
            .with_unit_mix(vec![UnitMixEntry::new(3, 2)])
            .with_vacancy(Decimal::ZERO);

        let analysis = underwriter.analyze(&test_property(), &overrides);

        assert_eq!(analysis.income.annual_gross_income, dec!(62400));
        assert_eq!(analysis.income.effective_gross_income, dec!(62400));
        assert_eq!(analysis.income.source, IncomeSource::UnitMix);
    }

    #[test]
    fn loan_term_override_moves_default_rate() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let overrides = PropertyOverride::default().with_loan_term(15);

        let analysis = underwriter.analyze(&test_property(), &overrides);

        assert_eq!(analysis.terms.interest_rate, dec!(0.065));
        assert_eq!(analysis.loan.term_years, 15);
    }

    #[test]
    fn explicit_rate_survives_term_change() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let overrides = PropertyOverride::default()
            .with_loan_term(15)
            .with_interest_rate(dec!(0.05));

        let analysis = underwriter.analyze(&test_property(), &overrides);

        assert_eq!(analysis.terms.interest_rate, dec!(0.05));
    }

    #[test]
    fn expense_override_flows_into_noi() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let overrides = PropertyOverride::default().with_expense(ExpenseLine::Insurance, dec!(3500));

        let analysis = underwriter.analyze(&test_property(), &overrides);

        assert_eq!(analysis.expenses.total, dec!(19552.80));
        assert_eq!(analysis.returns.net_operating_income, dec!(27007.20));
    }

    #[test]
    fn custom_property_without_mix_uses_zero_income() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let property = Property::custom("02124", dec!(300000), dec!(4000), 3);

        let analysis = underwriter.analyze(&property, &PropertyOverride::default());

        assert_eq!(analysis.income.annual_gross_income, Decimal::ZERO);
        assert_eq!(analysis.income.source, IncomeSource::ListingFallback);
        assert!(analysis.returns.dscr.is_some());
    }

    // =========================================================================
    // expense_defaults tests
    // =========================================================================

    #[test]
    fn expense_defaults_match_breakdown() {
        let table = test_table();
        let assumptions = FinancingAssumptions::default();
        let policy = ExpensePolicy::default();
        let underwriter = Underwriter::new(&table, &assumptions, &policy);
        let property = test_property();

        let defaults = underwriter.expense_defaults(&property, &PropertyOverride::default());
        let analysis = underwriter.analyze(&property, &PropertyOverride::default());

        for line in ExpenseLine::ALL {
            assert_eq!(defaults[&line], analysis.expenses.amount(line));
        }
    }
}
