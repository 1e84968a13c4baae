use std::collections::BTreeSet;
use std::io::Read;

use deal_core::{ListingId, Property, PropertyRepository, RepositoryError, UnitMixEntry};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::fields::{deserialize_optional_decimal, normalize_zip};

/// Errors that can occur when loading listing data.
#[derive(Debug, Error)]
pub enum PropertyLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Listing id is empty")]
    MissingListingId,

    #[error("Listing id 'CUSTOM' is reserved for hand-entered properties")]
    ReservedListingId,

    #[error("Listing {listing_id}: invalid ZIP code '{zip}'")]
    InvalidZip { listing_id: String, zip: String },

    #[error("Listing {listing_id}: invalid unit mix entry '{entry}'")]
    InvalidUnitMix { listing_id: String, entry: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for PropertyLoaderError {
    fn from(err: csv::Error) -> Self {
        PropertyLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the listings CSV export.
///
/// `unit_mix` is a `;`-separated list of `bedrooms:count` pairs, e.g.
/// `2:1;3:2` for one 2-BR and two 3-BR units.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub listing_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub zip: String,
    pub list_price: Decimal,
    pub tax: Decimal,
    pub total_units: u32,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub monthly_gross: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub operating_expenses: Option<Decimal>,
    #[serde(default)]
    pub unit_mix: String,
}

impl PropertyRecord {
    pub fn to_property(&self) -> Result<Property, PropertyLoaderError> {
        let listing_id = match ListingId::from(self.listing_id.trim()) {
            ListingId::Custom => return Err(PropertyLoaderError::ReservedListingId),
            ListingId::Listed(id) if id.is_empty() => {
                return Err(PropertyLoaderError::MissingListingId);
            }
            id => id,
        };

        let zip = normalize_zip(&self.zip).ok_or_else(|| PropertyLoaderError::InvalidZip {
            listing_id: listing_id.to_string(),
            zip: self.zip.clone(),
        })?;

        let unit_mix = parse_unit_mix(&self.unit_mix).map_err(|entry| {
            PropertyLoaderError::InvalidUnitMix {
                listing_id: listing_id.to_string(),
                entry,
            }
        })?;

        Ok(Property {
            listing_id,
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip,
            list_price: self.list_price,
            tax: self.tax,
            total_units: self.total_units,
            unit_mix,
            monthly_gross: self.monthly_gross,
            operating_expenses: self.operating_expenses,
        })
    }
}

/// Parses `bedrooms:count` pairs separated by `;`. Returns the offending
/// entry on failure.
pub fn parse_unit_mix(raw: &str) -> Result<Vec<UnitMixEntry>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (bedrooms, count) = entry.split_once(':').ok_or_else(|| entry.to_string())?;
            let bedrooms = bedrooms.trim().parse::<u8>().map_err(|_| entry.to_string())?;
            let count = count.trim().parse::<u32>().map_err(|_| entry.to_string())?;
            Ok(UnitMixEntry::new(bedrooms, count))
        })
        .collect()
}

/// Loader for listing data from CSV files.
pub struct PropertyLoader;

impl PropertyLoader {
    /// Parse listing records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PropertyRecord>, PropertyLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: PropertyRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validates every record, then upserts each listing.
    ///
    /// Nothing is written when any record is invalid. Stored overrides are
    /// left alone, so re-importing a listing keeps the user's edits. Returns
    /// the number of listings written.
    pub async fn load<R: PropertyRepository + ?Sized>(
        repo: &R,
        records: &[PropertyRecord],
    ) -> Result<usize, PropertyLoaderError> {
        let properties = records
            .iter()
            .map(PropertyRecord::to_property)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = BTreeSet::new();
        for property in &properties {
            if !seen.insert(property.listing_id.clone()) {
                warn!(listing = %property.listing_id, "duplicate listing in CSV; last row wins");
            }
            repo.upsert_property(property).await?;
        }

        info!(listings = seen.len(), "listings loaded");
        Ok(seen.len())
    }
}
