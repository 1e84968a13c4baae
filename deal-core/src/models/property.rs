use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier under which a property and its override are stored.
///
/// Hand-entered properties all share the `CUSTOM` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingId {
    Listed(String),
    Custom,
}

impl ListingId {
    pub const CUSTOM_KEY: &'static str = "CUSTOM";

    pub fn as_str(&self) -> &str {
        match self {
            Self::Listed(id) => id,
            Self::Custom => Self::CUSTOM_KEY,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl From<String> for ListingId {
    fn from(value: String) -> Self {
        if value == Self::CUSTOM_KEY {
            Self::Custom
        } else {
            Self::Listed(value)
        }
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ListingId> for String {
    fn from(value: ListingId) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ListingId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bedroom class within a unit mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMixEntry {
    pub bedrooms: u8,
    pub count: u32,
    /// Monthly rent override for this bedroom class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<Decimal>,
}

impl UnitMixEntry {
    pub fn new(
        bedrooms: u8,
        count: u32,
    ) -> Self {
        Self {
            bedrooms,
            count,
            rent: None,
        }
    }

    pub fn with_rent(
        mut self,
        rent: Decimal,
    ) -> Self {
        self.rent = Some(rent);
        self
    }
}

/// Total number of units described by a unit mix.
pub fn unit_mix_total(mix: &[UnitMixEntry]) -> u64 {
    mix.iter().map(|entry| u64::from(entry.count)).sum()
}

/// Rent override for a bedroom class. The last entry for that class wins.
pub fn class_rent_override(
    mix: &[UnitMixEntry],
    bedrooms: u8,
) -> Option<Decimal> {
    mix.iter()
        .rev()
        .find(|entry| entry.bedrooms == bedrooms)
        .and_then(|entry| entry.rent)
}

/// Source record for a listing or a hand-entered property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub listing_id: ListingId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub list_price: Decimal,
    /// Annual tax bill. `9999` is a placeholder meaning "unknown".
    pub tax: Decimal,
    pub total_units: u32,
    #[serde(default)]
    pub unit_mix: Vec<UnitMixEntry>,
    /// Monthly gross rent computed when the listing was ingested.
    #[serde(default)]
    pub monthly_gross: Option<Decimal>,
    /// Total operating expenses reported with the listing.
    #[serde(default)]
    pub operating_expenses: Option<Decimal>,
}

impl Property {
    /// A hand-entered property with only the fields a user typically knows.
    pub fn custom(
        zip: impl Into<String>,
        list_price: Decimal,
        tax: Decimal,
        total_units: u32,
    ) -> Self {
        Self {
            listing_id: ListingId::Custom,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: zip.into(),
            list_price,
            tax,
            total_units,
            unit_mix: Vec::new(),
            monthly_gross: None,
            operating_expenses: None,
        }
    }

    /// Single-line address for display.
    pub fn display_address(&self) -> String {
        [self.address.as_str(), self.city.as_str(), self.state.as_str(), self.zip.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn listing_id_round_trips_custom_key() {
        assert_eq!(ListingId::from("CUSTOM"), ListingId::Custom);
        assert_eq!(ListingId::Custom.to_string(), "CUSTOM");
        assert_eq!(ListingId::from("73012345"), ListingId::Listed("73012345".to_string()));
    }

    #[test]
    fn listing_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ListingId::Custom).unwrap();

        assert_eq!(json, "\"CUSTOM\"");
    }

    #[test]
    fn class_rent_override_takes_last_matching_entry() {
        let mix = vec![
            UnitMixEntry::new(2, 1).with_rent(dec!(1800)),
            UnitMixEntry::new(3, 1).with_rent(dec!(2400)),
            UnitMixEntry::new(2, 1).with_rent(dec!(2100)),
        ];

        assert_eq!(class_rent_override(&mix, 2), Some(dec!(2100)));
        assert_eq!(class_rent_override(&mix, 3), Some(dec!(2400)));
        assert_eq!(class_rent_override(&mix, 1), None);
    }

    #[test]
    fn class_rent_override_is_none_when_last_entry_has_no_rent() {
        let mix = vec![
            UnitMixEntry::new(2, 1).with_rent(dec!(1800)),
            UnitMixEntry::new(2, 1),
        ];

        assert_eq!(class_rent_override(&mix, 2), None);
    }

    #[test]
    fn unit_mix_total_sums_counts() {
        let mix = vec![UnitMixEntry::new(1, 2), UnitMixEntry::new(2, 3)];

        assert_eq!(unit_mix_total(&mix), 5);
    }

    #[test]
    fn display_address_skips_empty_parts() {
        let property = Property::custom("02124", dec!(500000), dec!(6000), 2);

        assert_eq!(property.display_address(), "02124");
    }
}
