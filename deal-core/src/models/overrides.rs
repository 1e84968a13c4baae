//! The user's partial override record for one property.
//!
//! A field left `None` (or an expense line absent from `opex`) means "use the
//! computed default". The same type doubles as a patch: [`PropertyOverride::merge`]
//! lays one record over another.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExpenseLine, UnitMixEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_mix: Option<Vec<UnitMixEntry>>,
    /// Vacancy as a fraction of gross income.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<Decimal>,
    /// Dollar amount per expense line.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub opex: BTreeMap<ExpenseLine, Decimal>,
    /// Down payment as a fraction of offer price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Decimal>,
    /// Loan term in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_term: Option<u32>,
    /// Closing costs as a fraction of offer price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<Decimal>,
    /// Due diligence as a fraction of offer price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_diligence: Option<Decimal>,
}

impl PropertyOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `self` with `patch` laid over it.
    ///
    /// Scalar fields take the patch value when present. `unit_mix` is
    /// replaced as a whole list; `opex` is merged line by line.
    pub fn merge(
        &self,
        patch: &PropertyOverride,
    ) -> PropertyOverride {
        let mut opex = self.opex.clone();
        opex.extend(patch.opex.iter().map(|(line, amount)| (*line, *amount)));

        PropertyOverride {
            offer_price: patch.offer_price.or(self.offer_price),
            unit_mix: patch
                .unit_mix
                .clone()
                .or_else(|| self.unit_mix.clone()),
            vacancy: patch.vacancy.or(self.vacancy),
            opex,
            down_payment: patch.down_payment.or(self.down_payment),
            interest_rate: patch.interest_rate.or(self.interest_rate),
            loan_term: patch.loan_term.or(self.loan_term),
            closing_costs: patch.closing_costs.or(self.closing_costs),
            due_diligence: patch.due_diligence.or(self.due_diligence),
        }
    }

    pub fn with_offer_price(
        mut self,
        price: Decimal,
    ) -> Self {
        self.offer_price = Some(price);
        self
    }

    pub fn with_unit_mix(
        mut self,
        mix: Vec<UnitMixEntry>,
    ) -> Self {
        self.unit_mix = Some(mix);
        self
    }

    pub fn with_vacancy(
        mut self,
        fraction: Decimal,
    ) -> Self {
        self.vacancy = Some(fraction);
        self
    }

    pub fn with_expense(
        mut self,
        line: ExpenseLine,
        amount: Decimal,
    ) -> Self {
        self.opex.insert(line, amount);
        self
    }

    pub fn with_down_payment(
        mut self,
        fraction: Decimal,
    ) -> Self {
        self.down_payment = Some(fraction);
        self
    }

    pub fn with_interest_rate(
        mut self,
        rate: Decimal,
    ) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    pub fn with_loan_term(
        mut self,
        years: u32,
    ) -> Self {
        self.loan_term = Some(years);
        self
    }

    pub fn with_closing_costs(
        mut self,
        fraction: Decimal,
    ) -> Self {
        self.closing_costs = Some(fraction);
        self
    }

    pub fn with_due_diligence(
        mut self,
        fraction: Decimal,
    ) -> Self {
        self.due_diligence = Some(fraction);
        self
    }
}
