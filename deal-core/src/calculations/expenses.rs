//! Operating-expense breakdown for a property.
//!
//! Every [`ExpenseLine`] gets a dollar value: the user's override for that line
//! when one exists, otherwise the line's default from [`ExpensePolicy`].
//!
//! | Line                | Default |
//! |---------------------|---------|
//! | taxes               | property tax bill; offer price × 0.15% when the bill is the 9999 placeholder |
//! | insurance           | flat $2,000 |
//! | water & sewer       | $400 × units |
//! | rubbish             | flat $1,000 |
//! | legal               | flat $1,000 |
//! | repairs             | 3% of effective gross income |
//! | property management | 8% of effective gross income |
//! | capital reserve     | 2% of effective gross income |
//! | licensing           | $0 |
//! | common electric     | 10% of the listing's reported total operating expenses |
//!
//! Four defaults scale with effective gross income, so the breakdown must be
//! rebuilt whenever income changes. An override on one line never changes
//! another line.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::common::saturating_sum;
use crate::models::{ExpenseLine, Property};

/// Constants behind the default expense policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpensePolicy {
    /// Tax bill value that means "unknown".
    pub tax_placeholder: Decimal,
    /// Fraction of offer price used as the tax bill when it is unknown.
    pub estimated_tax_rate: Decimal,
    pub insurance: Decimal,
    pub water_sewer_per_unit: Decimal,
    pub rubbish: Decimal,
    pub legal: Decimal,
    pub licensing: Decimal,
    pub repairs_fraction: Decimal,
    pub management_fraction: Decimal,
    pub capital_reserve_fraction: Decimal,
    /// Fraction of the listing's reported operating expenses.
    pub common_electric_fraction: Decimal,
}

impl Default for ExpensePolicy {
    fn default() -> Self {
        Self {
            tax_placeholder: dec!(9999),
            estimated_tax_rate: dec!(0.0015),
            insurance: dec!(2000),
            water_sewer_per_unit: dec!(400),
            rubbish: dec!(1000),
            legal: dec!(1000),
            licensing: Decimal::ZERO,
            repairs_fraction: dec!(0.03),
            management_fraction: dec!(0.08),
            capital_reserve_fraction: dec!(0.02),
            common_electric_fraction: dec!(0.10),
        }
    }
}

/// Inputs the default policy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseBasis<'a> {
    pub property: &'a Property,
    pub offer_price: Decimal,
    pub effective_gross_income: Decimal,
}

/// Whether a line's value came from the user or the default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseOrigin {
    Override,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseAmount {
    pub amount: Decimal,
    pub origin: ExpenseOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub lines: BTreeMap<ExpenseLine, ExpenseAmount>,
    pub total: Decimal,
}

impl ExpenseBreakdown {
    pub fn amount(
        &self,
        line: ExpenseLine,
    ) -> Decimal {
        self.lines
            .get(&line)
            .map(|entry| entry.amount)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExpenseModel<'a> {
    policy: &'a ExpensePolicy,
}

impl<'a> ExpenseModel<'a> {
    pub fn new(policy: &'a ExpensePolicy) -> Self {
        Self { policy }
    }

    /// Default dollar amount for one line.
    pub fn default_amount(
        &self,
        line: ExpenseLine,
        basis: &ExpenseBasis<'_>,
    ) -> Decimal {
        let policy = self.policy;
        let egi = basis.effective_gross_income;
        match line {
            ExpenseLine::Taxes => {
                if basis.property.tax == policy.tax_placeholder {
                    basis.offer_price.saturating_mul(policy.estimated_tax_rate)
                } else {
                    basis.property.tax
                }
            }
            ExpenseLine::Insurance => policy.insurance,
            ExpenseLine::WaterSewer => {
                policy
                    .water_sewer_per_unit
                    .saturating_mul(Decimal::from(basis.property.total_units))
            }
            ExpenseLine::Rubbish => policy.rubbish,
            ExpenseLine::Legal => policy.legal,
            ExpenseLine::Licensing => policy.licensing,
            ExpenseLine::Repairs => egi.saturating_mul(policy.repairs_fraction),
            ExpenseLine::PropertyManagement => egi.saturating_mul(policy.management_fraction),
            ExpenseLine::CapitalReserve => egi.saturating_mul(policy.capital_reserve_fraction),
            ExpenseLine::CommonElectric => {
                basis
                    .property
                    .operating_expenses
                    .unwrap_or(Decimal::ZERO)
                    .saturating_mul(policy.common_electric_fraction)
            }
        }
    }

    /// Builds the ten-line breakdown, taking overrides line by line.
    pub fn expenses(
        &self,
        basis: &ExpenseBasis<'_>,
        overrides: &BTreeMap<ExpenseLine, Decimal>,
    ) -> ExpenseBreakdown {
        let lines: BTreeMap<ExpenseLine, ExpenseAmount> = ExpenseLine::ALL
            .into_iter()
            .map(|line| {
                let entry = match overrides.get(&line) {
                    Some(amount) => ExpenseAmount {
                        amount: *amount,
                        origin: ExpenseOrigin::Override,
                    },
                    None => ExpenseAmount {
                        amount: self.default_amount(line, basis),
                        origin: ExpenseOrigin::Default,
                    },
                };
                (line, entry)
            })
            .collect();

        let total = saturating_sum(lines.values().map(|entry| entry.amount));

        ExpenseBreakdown { lines, total }
    }

    /// Full default map, suitable for committing as an override before the
    /// user edits individual lines.
    pub fn synthesize_defaults(
        &self,
        basis: &ExpenseBasis<'_>,
    ) -> BTreeMap<ExpenseLine, Decimal> {
        ExpenseLine::ALL
            .into_iter()
            .map(|line| (line, self.default_amount(line, basis)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_property() -> Property {
        let mut property = Property::custom("02124", dec!(500000), dec!(6000), 2);
        property.operating_expenses = Some(dec!(12000));
        property
    }

    fn basis(property: &Property) -> ExpenseBasis<'_> {
        ExpenseBasis {
            property,
            offer_price: dec!(500000),
            effective_gross_income: dec!(46560),
        }
    }

    // =========================================================================
    // default_amount tests
    // =========================================================================

    #[test]
    fn taxes_default_to_property_tax_bill() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();

        let result = model.default_amount(ExpenseLine::Taxes, &basis(&property));

        assert_eq!(result, dec!(6000));
    }

    #[test]
    fn placeholder_tax_bill_is_estimated_from_offer_price() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let mut property = test_property();
        property.tax = dec!(9999);

        let result = model.default_amount(ExpenseLine::Taxes, &basis(&property));

        assert_eq!(result, dec!(750));
    }

    #[test]
    fn water_sewer_scales_with_units() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();

        let result = model.default_amount(ExpenseLine::WaterSewer, &basis(&property));

        assert_eq!(result, dec!(800));
    }

    #[test]
    fn income_based_lines_scale_with_effective_gross_income() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();
        let basis = basis(&property);

        assert_eq!(model.default_amount(ExpenseLine::Repairs, &basis), dec!(1396.80));
        assert_eq!(
            model.default_amount(ExpenseLine::PropertyManagement, &basis),
            dec!(3724.80)
        );
        assert_eq!(
            model.default_amount(ExpenseLine::CapitalReserve, &basis),
            dec!(931.20)
        );
    }

    #[test]
    fn common_electric_uses_reported_operating_expenses() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();

        let result = model.default_amount(ExpenseLine::CommonElectric, &basis(&property));

        assert_eq!(result, dec!(1200));
    }

    #[test]
    fn common_electric_is_zero_without_reported_expenses() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = Property::custom("02124", dec!(500000), dec!(6000), 2);

        let result = model.default_amount(ExpenseLine::CommonElectric, &basis(&property));

        assert_eq!(result, Decimal::ZERO);
    }

    // =========================================================================
    // expenses tests
    // =========================================================================

    #[test]
    fn expenses_sum_all_default_lines() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();

        let breakdown = model.expenses(&basis(&property), &BTreeMap::new());

        // 800 + 1200 + 1000 + 2000 + 3724.80 + 1396.80 + 0 + 1000 + 931.20 + 6000
        assert_eq!(breakdown.total, dec!(18052.80));
        assert_eq!(breakdown.lines.len(), 10);
        assert!(
            breakdown
                .lines
                .values()
                .all(|entry| entry.origin == ExpenseOrigin::Default)
        );
    }

    #[test]
    fn override_replaces_only_its_own_line() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();
        let overrides = BTreeMap::from([(ExpenseLine::Insurance, dec!(3500))]);

        let breakdown = model.expenses(&basis(&property), &overrides);

        assert_eq!(
            breakdown.lines[&ExpenseLine::Insurance],
            ExpenseAmount {
                amount: dec!(3500),
                origin: ExpenseOrigin::Override,
            }
        );
        assert_eq!(breakdown.amount(ExpenseLine::Repairs), dec!(1396.80));
        assert_eq!(breakdown.total, dec!(19552.80));
    }

    #[test]
    fn overridden_income_line_ignores_income_changes() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();
        let overrides = BTreeMap::from([(ExpenseLine::PropertyManagement, dec!(5000))]);
        let richer = ExpenseBasis {
            effective_gross_income: dec!(100000),
            ..basis(&property)
        };

        let breakdown = model.expenses(&richer, &overrides);

        assert_eq!(breakdown.amount(ExpenseLine::PropertyManagement), dec!(5000));
        assert_eq!(breakdown.amount(ExpenseLine::Repairs), dec!(3000));
    }

    #[test]
    fn synthesized_defaults_cover_every_line() {
        let policy = ExpensePolicy::default();
        let model = ExpenseModel::new(&policy);
        let property = test_property();
        let basis = basis(&property);

        let defaults = model.synthesize_defaults(&basis);
        let breakdown = model.expenses(&basis, &defaults);

        assert_eq!(defaults.len(), 10);
        assert_eq!(breakdown.total, dec!(18052.80));
        assert!(
            breakdown
                .lines
                .values()
                .all(|entry| entry.origin == ExpenseOrigin::Override)
        );
    }
}
