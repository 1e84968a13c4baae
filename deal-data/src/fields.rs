//! Cell-level parsing shared by the CSV loaders.

use std::sync::LazyLock;

use regex::Regex;

static ZIP_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,5})(?:-\d{4})?$").ok());

/// Normalises a ZIP code to five digits.
///
/// Spreadsheet exports drop leading zeros (`2124` for `02124`) and some
/// sources carry ZIP+4. Both are accepted; anything else is `None`.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let pattern = ZIP_PATTERN.as_ref()?;
    let captures = pattern.captures(raw.trim())?;
    let digits = captures.get(1)?.as_str();

    Some(format!("{digits:0>5}"))
}

/// Deserializes an optional decimal, treating blank cells as missing.
pub(crate) fn deserialize_optional_decimal<'de, D>(
    deserializer: D
) -> Result<Option<rust_decimal::Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<rust_decimal::Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
