//! Return metrics from income, expenses and debt service.
//!
//! Ratios with a zero divisor are reported as `None` rather than as an error,
//! so a deal with no debt or no equity still produces every other figure.
//! Sums and products saturate at the bounds of `Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{MONTHS_PER_YEAR, ratio, saturating_sum};
use super::financing::LoanTerms;

/// Inputs to [`ReturnCalculator::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnInputs<'a> {
    pub annual_gross_income: Decimal,
    pub effective_gross_income: Decimal,
    pub total_expenses: Decimal,
    pub loan: &'a LoanTerms,
    pub offer_price: Decimal,
    pub total_units: u32,
    pub down_payment_fraction: Decimal,
    pub closing_costs_fraction: Decimal,
    pub due_diligence_fraction: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub net_operating_income: Decimal,
    pub dscr: Option<Decimal>,
    pub cap_rate: Option<Decimal>,
    pub monthly_cash_flow: Decimal,
    pub annual_cash_flow: Decimal,
    pub down_payment: Decimal,
    pub closing_costs: Decimal,
    pub due_diligence: Decimal,
    pub equity_required: Decimal,
    pub return_on_capital: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub gross_rent_multiplier: Option<Decimal>,
}

pub struct ReturnCalculator;

impl ReturnCalculator {
    pub fn evaluate(inputs: &ReturnInputs<'_>) -> ReturnMetrics {
        let noi = inputs
            .effective_gross_income
            .saturating_sub(inputs.total_expenses);
        let monthly_cash_flow = (noi / MONTHS_PER_YEAR).saturating_sub(inputs.loan.monthly_payment);
        let annual_cash_flow = monthly_cash_flow.saturating_mul(MONTHS_PER_YEAR);

        let down_payment = inputs.offer_price.saturating_mul(inputs.down_payment_fraction);
        let closing_costs = inputs.offer_price.saturating_mul(inputs.closing_costs_fraction);
        let due_diligence = inputs.offer_price.saturating_mul(inputs.due_diligence_fraction);
        let equity_required = saturating_sum([down_payment, closing_costs, due_diligence]);

        ReturnMetrics {
            net_operating_income: noi,
            dscr: ratio(noi, inputs.loan.annual_debt_service),
            cap_rate: ratio(noi, inputs.offer_price),
            monthly_cash_flow,
            annual_cash_flow,
            down_payment,
            closing_costs,
            due_diligence,
            equity_required,
            return_on_capital: ratio(annual_cash_flow, equity_required),
            price_per_unit: ratio(inputs.offer_price, Decimal::from(inputs.total_units)),
            gross_rent_multiplier: ratio(inputs.offer_price, inputs.annual_gross_income),
        }
    }
}
