//! Interactive underwriting of one property.
//!
//! A [`DealSession`] owns the live override state for a property and keeps a
//! [`DealAnalysis`] in step with it. Edits arrive as [`Edit`] values in
//! whichever unit the user typed (dollars or fractions) and are stored in the
//! override's canonical form, converted against the analysis current at the
//! time of the edit.

pub mod history;
pub mod store;

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

pub use history::HistoryStack;
pub use store::OverrideStore;

use crate::calculations::{DealAnalysis, Underwriter};
use crate::config::EngineConfig;
use crate::db::OverrideSink;
use crate::models::{
    AnalysisSnapshot, AssumptionProfile, ExpenseLine, ListingId, Property, PropertyOverride,
    RentTable, UnitMixEntry,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("listing {0} is not a custom property and cannot be replaced")]
    NotCustom(ListingId),

    #[error("cannot convert a dollar amount against a zero {0}")]
    ZeroBase(&'static str),

    #[error("unit mix has no {0}-bedroom units")]
    UnknownBedroomClass(u8),

    #[error("{0} is out of range")]
    Overflow(&'static str),
}

/// One user edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    OfferPrice(Decimal),
    UnitMix(Vec<UnitMixEntry>),
    /// Monthly rent for every unit of a bedroom class in the current mix.
    UnitRent { bedrooms: u8, rent: Decimal },
    VacancyFraction(Decimal),
    /// Annual vacancy loss in dollars.
    VacancyAmount(Decimal),
    ExpenseAmount(ExpenseLine, Decimal),
    /// Expense as a fraction of effective gross income.
    ExpenseFraction(ExpenseLine, Decimal),
    DownPaymentFraction(Decimal),
    DownPaymentAmount(Decimal),
    InterestRate(Decimal),
    LoanTerm(u32),
    ClosingCostsFraction(Decimal),
    ClosingCostsAmount(Decimal),
    DueDiligenceFraction(Decimal),
    DueDiligenceAmount(Decimal),
    /// Commits the default value of every expense line not yet overridden.
    SeedExpenseDefaults,
    /// Replaces the source record of a custom property.
    ReplaceProperty(Property),
    Reset,
}

pub struct DealSession {
    store: OverrideStore,
    rent_table: RentTable,
    config: EngineConfig,
    analysis: DealAnalysis,
}

impl DealSession {
    pub fn open(
        property: Property,
        stored: Option<PropertyOverride>,
        rent_table: RentTable,
        config: EngineConfig,
        sink: Arc<dyn OverrideSink>,
        history: HistoryStack<AnalysisSnapshot>,
    ) -> Self {
        info!(
            listing = %property.listing_id,
            resumed = stored.is_some(),
            "opening session"
        );

        let store = OverrideStore::load(property, stored, history, sink);
        let analysis = Self::underwrite(&rent_table, &config, &store);

        Self {
            store,
            rent_table,
            config,
            analysis,
        }
    }

    pub fn analysis(&self) -> &DealAnalysis {
        &self.analysis
    }

    pub fn property(&self) -> &Property {
        self.store.property()
    }

    pub fn overrides(&self) -> &PropertyOverride {
        self.store.overrides()
    }

    pub fn profile(&self) -> AssumptionProfile {
        AssumptionProfile::from(&self.store.property().listing_id)
    }

    pub fn history(&self) -> &HistoryStack<AnalysisSnapshot> {
        self.store.history()
    }

    pub fn apply(
        &mut self,
        edit: Edit,
    ) -> Result<&DealAnalysis, SessionError> {
        match edit {
            Edit::Reset => self.store.reset(),
            Edit::ReplaceProperty(property) => self.store.replace_property(property)?,
            edit => {
                let patch = self.patch_for(edit)?;
                self.store.merge(&patch);
            }
        }

        self.recompute();
        Ok(&self.analysis)
    }

    /// Steps back one edit. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let moved = self.store.undo();
        if moved {
            self.recompute();
        }
        moved
    }

    /// Steps forward one edit. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let moved = self.store.redo();
        if moved {
            self.recompute();
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.store.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.history().can_redo()
    }

    fn patch_for(
        &self,
        edit: Edit,
    ) -> Result<PropertyOverride, SessionError> {
        let patch = PropertyOverride::default();
        let current = &self.analysis;
        let offer_price = current.terms.offer_price;

        let patch = match edit {
            Edit::OfferPrice(price) => patch.with_offer_price(price),
            Edit::UnitMix(mix) => patch.with_unit_mix(mix),
            Edit::UnitRent { bedrooms, rent } => {
                let mut mix = current.terms.unit_mix.clone();
                let entry = mix
                    .iter_mut()
                    .rev()
                    .find(|entry| entry.bedrooms == bedrooms)
                    .ok_or(SessionError::UnknownBedroomClass(bedrooms))?;
                entry.rent = Some(rent);
                patch.with_unit_mix(mix)
            }
            Edit::VacancyFraction(fraction) => patch.with_vacancy(fraction),
            Edit::VacancyAmount(amount) => patch.with_vacancy(fraction_of(
                amount,
                current.income.annual_gross_income,
                "annual gross income",
            )?),
            Edit::ExpenseAmount(line, amount) => patch.with_expense(line, amount),
            Edit::ExpenseFraction(line, fraction) => {
                let amount = fraction
                    .checked_mul(current.income.effective_gross_income)
                    .ok_or(SessionError::Overflow("expense amount"))?;
                patch.with_expense(line, amount)
            }
            Edit::DownPaymentFraction(fraction) => patch.with_down_payment(fraction),
            Edit::DownPaymentAmount(amount) => {
                patch.with_down_payment(fraction_of(amount, offer_price, "offer price")?)
            }
            Edit::InterestRate(rate) => patch.with_interest_rate(rate),
            Edit::LoanTerm(years) => patch.with_loan_term(years),
            Edit::ClosingCostsFraction(fraction) => patch.with_closing_costs(fraction),
            Edit::ClosingCostsAmount(amount) => {
                patch.with_closing_costs(fraction_of(amount, offer_price, "offer price")?)
            }
            Edit::DueDiligenceFraction(fraction) => patch.with_due_diligence(fraction),
            Edit::DueDiligenceAmount(amount) => {
                patch.with_due_diligence(fraction_of(amount, offer_price, "offer price")?)
            }
            Edit::SeedExpenseDefaults => {
                let overridden = &self.store.overrides().opex;
                self.underwriter()
                    .expense_defaults(self.store.property(), self.store.overrides())
                    .into_iter()
                    .filter(|(line, _)| !overridden.contains_key(line))
                    .fold(patch, |patch, (line, amount)| patch.with_expense(line, amount))
            }
            Edit::Reset | Edit::ReplaceProperty(_) => patch,
        };

        Ok(patch)
    }

    fn underwriter(&self) -> Underwriter<'_> {
        Underwriter::new(
            &self.rent_table,
            self.config.for_profile(self.profile()),
            &self.config.expenses,
        )
    }

    fn recompute(&mut self) {
        self.analysis = Self::underwrite(&self.rent_table, &self.config, &self.store);
    }

    fn underwrite(
        rent_table: &RentTable,
        config: &EngineConfig,
        store: &OverrideStore,
    ) -> DealAnalysis {
        let profile = AssumptionProfile::from(&store.property().listing_id);
        Underwriter::new(rent_table, config.for_profile(profile), &config.expenses)
            .analyze(store.property(), store.overrides())
    }
}

fn fraction_of(
    amount: Decimal,
    base: Decimal,
    base_name: &'static str,
) -> Result<Decimal, SessionError> {
    if base.is_zero() {
        return Err(SessionError::ZeroBase(base_name));
    }
    amount
        .checked_div(base)
        .ok_or(SessionError::Overflow("fraction"))
}
