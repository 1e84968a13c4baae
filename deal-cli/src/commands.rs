//! Line-oriented edit commands read by `deal session`.

use deal_core::{Edit, ExpenseLine, Property};
use deal_data::parse_unit_mix;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::utils::{Amount, ParseAmountError, parse_amount, parse_decimal};

pub const HELP: &str = "\
Commands:
  offer <$amount>                 offer price
  mix <beds:count>...             unit mix, e.g. `mix 2:1 3:2`
  rent <beds> <$amount>           monthly rent for a bedroom class
  vacancy <rate|$amount>          vacancy as a rate or annual dollars
  expense <line> <$amount|rate%>  annual expense, or a percentage of EGI
  down <rate|$amount>             down payment
  rate <rate>                     annual interest rate
  term <years>                    loan term
  closing <rate|$amount>          closing costs
  diligence <rate|$amount>        due diligence costs
  seed-expenses                   commit default expenses as overrides
  property key=value...           edit a custom property (zip, price, tax, units, gross, opex)
  reset                           clear every override
  undo | redo                     step through history
  show                            print the analysis
  history                         print the history position
  log <level>                     change the log filter
  help | quit

Rates accept `6.5%` or `0.065`. Amounts accept `$1,250` or `1250`.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'; type `help` for a list")]
    UnknownCommand(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{command}` takes no argument '{argument}'")]
    UnexpectedArgument {
        command: &'static str,
        argument: String,
    },

    #[error(transparent)]
    InvalidAmount(#[from] ParseAmountError),

    #[error("`{command}` expects {expected}")]
    WrongUnit {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid {argument} '{value}'")]
    InvalidInteger {
        argument: &'static str,
        value: String,
    },

    #[error("unknown expense line '{0}'")]
    UnknownExpenseLine(String),

    #[error("invalid unit mix entry '{0}'")]
    InvalidUnitMix(String),

    #[error("unknown property field '{0}'")]
    UnknownPropertyField(String),
}

/// Field changes for a hand-entered property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    pub zip: Option<String>,
    pub list_price: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total_units: Option<u32>,
    pub monthly_gross: Option<Decimal>,
    pub operating_expenses: Option<Decimal>,
}

impl PropertyChanges {
    pub fn apply_to(
        &self,
        property: &Property,
    ) -> Property {
        let mut updated = property.clone();
        if let Some(zip) = &self.zip {
            updated.zip = zip.clone();
        }
        if let Some(price) = self.list_price {
            updated.list_price = price;
        }
        if let Some(tax) = self.tax {
            updated.tax = tax;
        }
        if let Some(units) = self.total_units {
            updated.total_units = units;
        }
        if let Some(gross) = self.monthly_gross {
            updated.monthly_gross = Some(gross);
        }
        if let Some(opex) = self.operating_expenses {
            updated.operating_expenses = Some(opex);
        }
        updated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(Edit),
    Property(PropertyChanges),
    Undo,
    Redo,
    Show,
    History,
    Log(String),
    Help,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "offer" => {
            let price = dollars("offer", one_arg("offer", "a price", &args)?)?;
            Command::Edit(Edit::OfferPrice(price))
        }
        "mix" => {
            if args.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "mix",
                    argument: "at least one beds:count pair",
                });
            }
            let mix = parse_unit_mix(&args.join(";")).map_err(CommandError::InvalidUnitMix)?;
            Command::Edit(Edit::UnitMix(mix))
        }
        "rent" => {
            let [bedrooms, rent] = two_args("rent", "a bedroom count and a rent", &args)?;
            Command::Edit(Edit::UnitRent {
                bedrooms: integer("bedroom count", bedrooms)?,
                rent: dollars("rent", rent)?,
            })
        }
        "vacancy" => Command::Edit(rate_or_dollars(
            one_arg("vacancy", "a rate or amount", &args)?,
            Edit::VacancyFraction,
            Edit::VacancyAmount,
        )?),
        "expense" => {
            let [line_name, value] = two_args("expense", "a line and an amount", &args)?;
            let line = ExpenseLine::parse(line_name)
                .ok_or_else(|| CommandError::UnknownExpenseLine(line_name.to_string()))?;
            match parse_amount(value)? {
                Amount::Dollars(amount) | Amount::Plain(amount) => {
                    Command::Edit(Edit::ExpenseAmount(line, amount))
                }
                Amount::Percent(fraction) => Command::Edit(Edit::ExpenseFraction(line, fraction)),
            }
        }
        "down" => Command::Edit(rate_or_dollars(
            one_arg("down", "a rate or amount", &args)?,
            Edit::DownPaymentFraction,
            Edit::DownPaymentAmount,
        )?),
        "rate" => {
            let rate = fraction("rate", one_arg("rate", "a rate", &args)?)?;
            Command::Edit(Edit::InterestRate(rate))
        }
        "term" => {
            let years = integer("term", one_arg("term", "a number of years", &args)?)?;
            Command::Edit(Edit::LoanTerm(years))
        }
        "closing" => Command::Edit(rate_or_dollars(
            one_arg("closing", "a rate or amount", &args)?,
            Edit::ClosingCostsFraction,
            Edit::ClosingCostsAmount,
        )?),
        "diligence" => Command::Edit(rate_or_dollars(
            one_arg("diligence", "a rate or amount", &args)?,
            Edit::DueDiligenceFraction,
            Edit::DueDiligenceAmount,
        )?),
        "seed-expenses" => {
            no_args("seed-expenses", &args)?;
            Command::Edit(Edit::SeedExpenseDefaults)
        }
        "property" => Command::Property(property_changes(&args)?),
        "reset" => {
            no_args("reset", &args)?;
            Command::Edit(Edit::Reset)
        }
        "undo" => {
            no_args("undo", &args)?;
            Command::Undo
        }
        "redo" => {
            no_args("redo", &args)?;
            Command::Redo
        }
        "show" => Command::Show,
        "history" => Command::History,
        "log" => Command::Log(one_arg("log", "a level", &args)?.to_string()),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
}

fn no_args(
    command: &'static str,
    args: &[&str],
) -> Result<(), CommandError> {
    match args.first() {
        Some(extra) => Err(CommandError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        }),
        None => Ok(()),
    }
}

fn one_arg<'a>(
    command: &'static str,
    argument: &'static str,
    args: &[&'a str],
) -> Result<&'a str, CommandError> {
    match args {
        [value] => Ok(*value),
        [] => Err(CommandError::MissingArgument { command, argument }),
        [_, extra, ..] => Err(CommandError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        }),
    }
}

fn two_args<'a>(
    command: &'static str,
    argument: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; 2], CommandError> {
    match args {
        [first, second] => Ok([*first, *second]),
        [_, _, extra, ..] => Err(CommandError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        }),
        _ => Err(CommandError::MissingArgument { command, argument }),
    }
}

fn integer<T: std::str::FromStr>(
    argument: &'static str,
    value: &str,
) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidInteger {
        argument,
        value: value.to_string(),
    })
}

fn dollars(
    command: &'static str,
    value: &str,
) -> Result<Decimal, CommandError> {
    match parse_amount(value)? {
        Amount::Dollars(amount) | Amount::Plain(amount) => Ok(amount),
        Amount::Percent(_) => Err(CommandError::WrongUnit {
            command,
            expected: "a dollar amount",
        }),
    }
}

fn fraction(
    command: &'static str,
    value: &str,
) -> Result<Decimal, CommandError> {
    match parse_amount(value)? {
        Amount::Percent(fraction) | Amount::Plain(fraction) => Ok(fraction),
        Amount::Dollars(_) => Err(CommandError::WrongUnit {
            command,
            expected: "a rate",
        }),
    }
}

fn rate_or_dollars(
    value: &str,
    as_fraction: fn(Decimal) -> Edit,
    as_dollars: fn(Decimal) -> Edit,
) -> Result<Edit, CommandError> {
    Ok(match parse_amount(value)? {
        Amount::Percent(fraction) | Amount::Plain(fraction) => as_fraction(fraction),
        Amount::Dollars(amount) => as_dollars(amount),
    })
}

fn property_changes(args: &[&str]) -> Result<PropertyChanges, CommandError> {
    if args.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "property",
            argument: "at least one key=value pair",
        });
    }

    let mut changes = PropertyChanges::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| CommandError::UnknownPropertyField(arg.to_string()))?;
        match key.to_ascii_lowercase().as_str() {
            "zip" => changes.zip = Some(value.to_string()),
            "price" => changes.list_price = Some(parse_decimal(value.trim_start_matches('$'))?),
            "tax" => changes.tax = Some(parse_decimal(value.trim_start_matches('$'))?),
            "units" => changes.total_units = Some(integer("unit count", value)?),
            "gross" => {
                changes.monthly_gross = Some(parse_decimal(value.trim_start_matches('$'))?)
            }
            "opex" => {
                changes.operating_expenses = Some(parse_decimal(value.trim_start_matches('$'))?)
            }
            _ => return Err(CommandError::UnknownPropertyField(key.to_string())),
        }
    }

    Ok(changes)
}
