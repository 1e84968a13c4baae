//! Plain-text reports for the terminal.

use std::fmt::Write;

use deal_core::calculations::common::round_half_up;
use deal_core::calculations::{ExpenseOrigin, IncomeSource};
use deal_core::models::AnalysisSnapshot;
use deal_core::{AssumptionProfile, DealAnalysis, HistoryStack, Property};
use rust_decimal::Decimal;

const NOT_AVAILABLE: &str = "n/a";

/// `$1,234.57`, rounded half-up to cents.
pub fn money(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// `6.50%` for a fraction of `0.065`.
pub fn percent(fraction: Decimal) -> String {
    format!("{:.2}%", round_half_up(fraction.saturating_mul(Decimal::ONE_HUNDRED)))
}

/// A ratio to two places, or `n/a` when it has no value.
pub fn ratio(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{:.2}", round_half_up(v)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn optional_percent(value: Option<Decimal>) -> String {
    value
        .map(percent)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn optional_money(value: Option<Decimal>) -> String {
    value.map(money).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Full underwriting report for one property.
pub fn render_analysis(
    property: &Property,
    profile: AssumptionProfile,
    analysis: &DealAnalysis,
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_analysis(&mut out, property, profile, analysis);
    out
}

fn write_analysis(
    out: &mut String,
    property: &Property,
    profile: AssumptionProfile,
    analysis: &DealAnalysis,
) -> std::fmt::Result {
    let terms = &analysis.terms;
    let income = &analysis.income;
    let loan = &analysis.loan;
    let returns = &analysis.returns;

    let profile_name = match profile {
        AssumptionProfile::Listed => "listed",
        AssumptionProfile::Custom => "custom",
    };
    writeln!(out, "{} [{}] ({profile_name})", property.display_address(), property.listing_id)?;
    writeln!(
        out,
        "  List price {}  Offer {}  Units {}",
        money(property.list_price),
        money(terms.offer_price),
        property.total_units
    )?;

    writeln!(out)?;
    writeln!(out, "Income")?;
    for unit in &income.units {
        writeln!(
            out,
            "  {} x {}BR @ {}/mo{:>16}",
            unit.count,
            unit.bedrooms,
            money(unit.monthly_rent),
            money(unit.annual_income)
        )?;
    }
    if income.source == IncomeSource::ListingFallback {
        writeln!(out, "  (unit mix unusable; using listing gross)")?;
    }
    writeln!(out, "  Gross income{:>28}", money(income.annual_gross_income))?;
    writeln!(
        out,
        "  Vacancy {:<8}{:>24}",
        percent(income.vacancy_fraction),
        money(-income.vacancy_amount)
    )?;
    writeln!(out, "  Effective gross income{:>18}", money(income.effective_gross_income))?;

    writeln!(out)?;
    writeln!(out, "Expenses")?;
    for (line, entry) in &analysis.expenses.lines {
        let marker = match entry.origin {
            ExpenseOrigin::Override => "*",
            ExpenseOrigin::Default => " ",
        };
        writeln!(out, " {marker}{:<24}{:>16}", line.label(), money(entry.amount))?;
    }
    writeln!(out, "  Total expenses{:>26}", money(analysis.expenses.total))?;

    writeln!(out)?;
    writeln!(out, "Financing")?;
    writeln!(
        out,
        "  Down payment {} ({})",
        percent(terms.down_payment_fraction),
        money(returns.down_payment)
    )?;
    writeln!(out, "  Loan amount{:>29}", money(loan.loan_amount))?;
    writeln!(
        out,
        "  Rate {} over {} years",
        percent(loan.annual_rate),
        loan.term_years
    )?;
    writeln!(out, "  Monthly payment{:>25}", money(loan.monthly_payment))?;
    writeln!(out, "  Annual debt service{:>21}", money(loan.annual_debt_service))?;

    writeln!(out)?;
    writeln!(out, "Returns")?;
    writeln!(out, "  Net operating income{:>20}", money(returns.net_operating_income))?;
    writeln!(out, "  Monthly cash flow{:>23}", money(returns.monthly_cash_flow))?;
    writeln!(out, "  Annual cash flow{:>24}", money(returns.annual_cash_flow))?;
    writeln!(out, "  DSCR{:>36}", ratio(returns.dscr))?;
    writeln!(out, "  Cap rate{:>32}", optional_percent(returns.cap_rate))?;
    writeln!(
        out,
        "  Closing costs {} / due diligence {}",
        money(returns.closing_costs),
        money(returns.due_diligence)
    )?;
    writeln!(out, "  Equity required{:>25}", money(returns.equity_required))?;
    writeln!(out, "  Return on capital{:>23}", optional_percent(returns.return_on_capital))?;
    writeln!(out, "  Price per unit{:>26}", optional_money(returns.price_per_unit))?;
    writeln!(out, "  Gross rent multiplier{:>19}", ratio(returns.gross_rent_multiplier))?;

    Ok(())
}

/// Headline figures after an edit.
pub fn render_summary(analysis: &DealAnalysis) -> String {
    let returns = &analysis.returns;
    format!(
        "offer {}  EGI {}  NOI {}  cash flow {}/mo  DSCR {}  cap {}",
        money(analysis.terms.offer_price),
        money(analysis.income.effective_gross_income),
        money(returns.net_operating_income),
        money(returns.monthly_cash_flow),
        ratio(returns.dscr),
        optional_percent(returns.cap_rate)
    )
}

/// One line per listing.
pub fn render_listings(properties: &[Property]) -> String {
    if properties.is_empty() {
        return "No listings.\n".to_string();
    }

    properties
        .iter()
        .map(|property| {
            format!(
                "{:<10} {:>16}  {:>2} units  {}\n",
                property.listing_id.as_str(),
                money(property.list_price),
                property.total_units,
                property.display_address()
            )
        })
        .collect()
}

/// `history 2/3 (undo, redo)`.
pub fn render_history(history: &HistoryStack<AnalysisSnapshot>) -> String {
    let position = history.cursor().map(|cursor| cursor + 1).unwrap_or(0);
    let moves: Vec<&str> = [
        history.can_undo().then_some("undo"),
        history.can_redo().then_some("redo"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if moves.is_empty() {
        format!("history {position}/{}", history.len())
    } else {
        format!("history {position}/{} ({})", history.len(), moves.join(", "))
    }
}
