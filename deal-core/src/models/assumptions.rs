use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ListingId;

/// Quoted annual rate for a loan term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRate {
    pub term_years: u32,
    pub rate: Decimal,
}

/// Term-dependent default interest rates.
///
/// A term with no exact entry uses the longest listed term that does not
/// exceed it; a term shorter than every entry uses the shortest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSchedule(Vec<TermRate>);

impl RateSchedule {
    pub fn new(mut entries: Vec<TermRate>) -> Self {
        entries.sort_by_key(|entry| entry.term_years);
        Self(entries)
    }

    pub fn rate_for(
        &self,
        term_years: u32,
    ) -> Decimal {
        self.0
            .iter()
            .filter(|entry| entry.term_years <= term_years)
            .max_by_key(|entry| entry.term_years)
            .or_else(|| self.0.iter().min_by_key(|entry| entry.term_years))
            .map(|entry| entry.rate)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn entries(&self) -> &[TermRate] {
        &self.0
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self::new(vec![
            TermRate {
                term_years: 10,
                rate: dec!(0.0625),
            },
            TermRate {
                term_years: 15,
                rate: dec!(0.065),
            },
            TermRate {
                term_years: 20,
                rate: dec!(0.0675),
            },
            TermRate {
                term_years: 30,
                rate: dec!(0.07),
            },
        ])
    }
}

/// Financing and vacancy defaults a consumer injects into the engine.
///
/// All fractions are expressed as decimals (`0.20` for 20%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingAssumptions {
    pub down_payment_fraction: Decimal,
    /// Fixed annual rate. When unset the rate comes from `rate_schedule`.
    pub interest_rate: Option<Decimal>,
    pub rate_schedule: RateSchedule,
    pub term_years: u32,
    pub closing_costs_fraction: Decimal,
    pub due_diligence_fraction: Decimal,
    pub vacancy_fraction: Decimal,
}

impl FinancingAssumptions {
    /// Default annual rate for the given term.
    pub fn rate_for_term(
        &self,
        term_years: u32,
    ) -> Decimal {
        self.interest_rate
            .unwrap_or_else(|| self.rate_schedule.rate_for(term_years))
    }
}

impl Default for FinancingAssumptions {
    fn default() -> Self {
        Self {
            down_payment_fraction: dec!(0.20),
            interest_rate: None,
            rate_schedule: RateSchedule::default(),
            term_years: 30,
            closing_costs_fraction: dec!(0.03),
            due_diligence_fraction: dec!(0.01),
            vacancy_fraction: dec!(0.03),
        }
    }
}

/// Which family of defaults a session runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionProfile {
    /// A property loaded from the listings feed.
    Listed,
    /// A property typed in by hand.
    Custom,
}

impl From<&ListingId> for AssumptionProfile {
    fn from(id: &ListingId) -> Self {
        if id.is_custom() {
            Self::Custom
        } else {
            Self::Listed
        }
    }
}
