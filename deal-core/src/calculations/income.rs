//! Gross and effective gross income for a property.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Effective rent per unit-mix entry (override, market rent, or 0) |
//! | 2    | Annual gross = Σ rent × count × 12 |
//! | 3    | Vacancy = annual gross × vacancy fraction |
//! | 4    | Effective gross income = annual gross − vacancy |
//!
//! When the unit mix is empty or its counts do not add up to the property's
//! unit total, step 2 uses the listing's own monthly gross × 12 instead. That
//! keeps a figure on screen while a unit mix is being rewritten.
//!
//! Rent overrides are taken as typed, so every product saturates at the
//! bounds of `Decimal` rather than overflowing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::RentResolver;
use super::common::{MONTHS_PER_YEAR, saturating_sum};
use crate::models::{Property, UnitMixEntry, class_rent_override, unit_mix_total};

/// Where the annual gross figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeSource {
    UnitMix,
    /// The unit mix was empty or inconsistent; the listing's monthly gross
    /// was used.
    ListingFallback,
}

/// Income contributed by one unit-mix entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitIncome {
    pub bedrooms: u8,
    pub count: u32,
    pub monthly_rent: Decimal,
    pub annual_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub units: Vec<UnitIncome>,
    pub annual_gross_income: Decimal,
    pub vacancy_fraction: Decimal,
    pub vacancy_amount: Decimal,
    pub effective_gross_income: Decimal,
    pub source: IncomeSource,
}

#[derive(Debug, Clone, Copy)]
pub struct IncomeAggregator<'a> {
    resolver: RentResolver<'a>,
}

impl<'a> IncomeAggregator<'a> {
    pub fn new(resolver: RentResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Per-entry rents and incomes for a unit mix in `zip`.
    ///
    /// Rent overrides apply per bedroom class: when several entries share a
    /// bedroom count, the last one's rent applies to all of them.
    pub fn unit_incomes(
        &self,
        zip: &str,
        unit_mix: &[UnitMixEntry],
    ) -> Vec<UnitIncome> {
        unit_mix
            .iter()
            .map(|entry| {
                let monthly_rent = self.resolver.resolve(
                    entry.bedrooms,
                    zip,
                    class_rent_override(unit_mix, entry.bedrooms),
                );
                UnitIncome {
                    bedrooms: entry.bedrooms,
                    count: entry.count,
                    monthly_rent,
                    annual_income: monthly_rent
                        .saturating_mul(Decimal::from(entry.count))
                        .saturating_mul(MONTHS_PER_YEAR),
                }
            })
            .collect()
    }

    /// Annual gross rent of a unit mix, with no fallback applied.
    pub fn gross_from_mix(
        &self,
        zip: &str,
        unit_mix: &[UnitMixEntry],
    ) -> Decimal {
        saturating_sum(
            self.unit_incomes(zip, unit_mix)
                .iter()
                .map(|unit| unit.annual_income),
        )
    }

    /// Rolls a unit mix up into gross income, vacancy loss and effective gross
    /// income for `property`.
    pub fn aggregate(
        &self,
        property: &Property,
        unit_mix: &[UnitMixEntry],
        vacancy_fraction: Decimal,
    ) -> IncomeSummary {
        let consistent = !unit_mix.is_empty()
            && unit_mix_total(unit_mix) == u64::from(property.total_units);

        let (units, annual_gross_income, source) = if consistent {
            let units = self.unit_incomes(&property.zip, unit_mix);
            let gross = saturating_sum(units.iter().map(|unit| unit.annual_income));
            (units, gross, IncomeSource::UnitMix)
        } else {
            warn!(
                listing = %property.listing_id,
                mix_units = unit_mix_total(unit_mix),
                total_units = property.total_units,
                "unit mix empty or inconsistent, using listing gross"
            );
            let monthly = property.monthly_gross.unwrap_or(Decimal::ZERO);
            (
                Vec::new(),
                monthly.saturating_mul(MONTHS_PER_YEAR),
                IncomeSource::ListingFallback,
            )
        };

        let vacancy_amount = annual_gross_income.saturating_mul(vacancy_fraction);

        IncomeSummary {
            units,
            annual_gross_income,
            vacancy_fraction,
            vacancy_amount,
            effective_gross_income: annual_gross_income.saturating_sub(vacancy_amount),
            source,
        }
    }
}
