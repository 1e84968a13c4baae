use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Highest bedroom key in a rent row. It stands for "this many or more".
pub const MAX_BEDROOM_KEY: u8 = 6;

/// Market rents for one ZIP code, indexed by bedroom count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRentRow {
    pub zip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub rents: BTreeMap<u8, Decimal>,
}

impl MarketRentRow {
    pub fn new(zip: impl Into<String>) -> Self {
        Self {
            zip: zip.into(),
            city: None,
            rents: BTreeMap::new(),
        }
    }

    pub fn with_rent(
        mut self,
        bedrooms: u8,
        rent: Decimal,
    ) -> Self {
        self.rents.insert(bedrooms.min(MAX_BEDROOM_KEY), rent);
        self
    }
}

/// ZIP → bedroom → monthly rent lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentTable {
    by_zip: HashMap<String, BTreeMap<u8, Decimal>>,
}

impl RentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows. A later row for the same ZIP replaces an
    /// earlier one.
    pub fn from_rows(rows: impl IntoIterator<Item = MarketRentRow>) -> Self {
        let by_zip = rows.into_iter().map(|row| (row.zip, row.rents)).collect();
        Self { by_zip }
    }

    pub fn insert(
        &mut self,
        row: MarketRentRow,
    ) {
        self.by_zip.insert(row.zip, row.rents);
    }

    /// Market rent for a unit, or `None` when the ZIP or bedroom key is
    /// missing. Counts above [`MAX_BEDROOM_KEY`] use the "or more" key.
    pub fn lookup(
        &self,
        zip: &str,
        bedrooms: u8,
    ) -> Option<Decimal> {
        self.by_zip
            .get(zip)
            .and_then(|rents| rents.get(&bedrooms.min(MAX_BEDROOM_KEY)))
            .copied()
    }

    pub fn contains_zip(
        &self,
        zip: &str,
    ) -> bool {
        self.by_zip.contains_key(zip)
    }

    pub fn len(&self) -> usize {
        self.by_zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zip.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn dorchester() -> MarketRentRow {
        MarketRentRow::new("02124")
            .with_rent(0, dec!(2212))
            .with_rent(2, dec!(2827))
            .with_rent(6, dec!(4894))
    }

    #[test]
    fn lookup_returns_rent_for_known_zip_and_bedrooms() {
        let table = RentTable::from_rows([dorchester()]);

        assert_eq!(table.lookup("02124", 2), Some(dec!(2827)));
        assert_eq!(table.lookup("02124", 0), Some(dec!(2212)));
    }

    #[test]
    fn lookup_misses_unknown_zip() {
        let table = RentTable::from_rows([dorchester()]);

        assert_eq!(table.lookup("99999", 2), None);
    }

    #[test]
    fn lookup_misses_absent_bedroom_key() {
        let table = RentTable::from_rows([dorchester()]);

        assert_eq!(table.lookup("02124", 3), None);
    }

    #[test]
    fn lookup_maps_large_units_onto_six_plus_key() {
        let table = RentTable::from_rows([dorchester()]);

        assert_eq!(table.lookup("02124", 9), Some(dec!(4894)));
    }

    #[test]
    fn later_rows_replace_earlier_rows_for_same_zip() {
        let table = RentTable::from_rows([
            dorchester(),
            MarketRentRow::new("02124").with_rent(2, dec!(3000)),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("02124", 2), Some(dec!(3000)));
        assert_eq!(table.lookup("02124", 0), None);
    }
}
