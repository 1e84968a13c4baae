//! Underwriting calculations.
//!
//! Each stage is a small, pure component; [`Underwriter`] chains them into a
//! full [`DealAnalysis`] for one property and override record.

pub mod analysis;
pub mod common;
pub mod expenses;
pub mod financing;
pub mod income;
pub mod rent;
pub mod returns;

pub use analysis::{DealAnalysis, ResolvedTerms, Underwriter};
pub use expenses::{
    ExpenseAmount, ExpenseBasis, ExpenseBreakdown, ExpenseModel, ExpenseOrigin, ExpensePolicy,
};
pub use financing::{AmortizationPeriod, AmortizationSchedule, FinancingModel, LoanTerms};
pub use income::{IncomeAggregator, IncomeSource, IncomeSummary, UnitIncome};
pub use rent::RentResolver;
pub use returns::{ReturnCalculator, ReturnInputs, ReturnMetrics};
