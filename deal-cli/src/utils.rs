use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as an amount.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid amount '{input}'")]
pub struct ParseAmountError {
    input: String,
}

/// A number as typed at the prompt, before it is assigned a meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    /// `$1,250` or a bare number in a dollar context.
    Dollars(Decimal),
    /// `6.5%`, already divided by 100.
    Percent(Decimal),
    /// A bare number such as `0.065`.
    Plain(Decimal),
}

static AMOUNT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<dollar>\$)?(?P<number>-?\d[\d,]*(?:\.\d+)?)(?P<percent>%)?$").ok()
});

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseAmountError> {
    normalize_decimal_input(s)
        .parse()
        .map_err(|_| ParseAmountError {
            input: s.to_string(),
        })
}

/// Parses a typed amount, recognising a leading `$` or a trailing `%`.
///
/// `$` and `%` together are rejected.
pub fn parse_amount(s: &str) -> Result<Amount, ParseAmountError> {
    let invalid = || ParseAmountError {
        input: s.to_string(),
    };

    let pattern = AMOUNT_PATTERN.as_ref().ok_or_else(invalid)?;
    let captures = pattern.captures(s.trim()).ok_or_else(invalid)?;
    let number = parse_decimal(captures.name("number").ok_or_else(invalid)?.as_str())
        .map_err(|_| invalid())?;

    match (captures.name("dollar"), captures.name("percent")) {
        (Some(_), Some(_)) => Err(invalid()),
        (Some(_), None) => Ok(Amount::Dollars(number)),
        (None, Some(_)) => Ok(Amount::Percent(number / Decimal::ONE_HUNDRED)),
        (None, None) => Ok(Amount::Plain(number)),
    }
}
