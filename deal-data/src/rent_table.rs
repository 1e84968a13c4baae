use std::collections::BTreeMap;
use std::io::Read;

use deal_core::{MarketRentRow, PropertyRepository, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::fields::{deserialize_optional_decimal, normalize_zip};

/// Errors that can occur when loading market-rent data.
#[derive(Debug, Error)]
pub enum RentTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid ZIP code '{0}'")]
    InvalidZip(String),

    #[error("Negative rent {rent} for {bedrooms} bedrooms in ZIP {zip}")]
    NegativeRent {
        zip: String,
        bedrooms: u8,
        rent: Decimal,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for RentTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RentTableLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the payment-standards CSV export.
///
/// One row per ZIP; each `*_rent` column is the monthly standard for that
/// bedroom count. Blank cells mean the source publishes no standard.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RentTableRecord {
    pub zip_code: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub studio_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub one_br_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub two_br_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub three_br_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub four_br_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub five_br_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub six_br_rent: Option<Decimal>,
}

impl RentTableRecord {
    /// Rents in bedroom order, studio first.
    fn rents(&self) -> [Option<Decimal>; 7] {
        [
            self.studio_rent,
            self.one_br_rent,
            self.two_br_rent,
            self.three_br_rent,
            self.four_br_rent,
            self.five_br_rent,
            self.six_br_rent,
        ]
    }

    /// Converts the record into a [`MarketRentRow`] keyed by its normalised ZIP.
    pub fn to_row(&self) -> Result<MarketRentRow, RentTableLoaderError> {
        let zip = normalize_zip(&self.zip_code)
            .ok_or_else(|| RentTableLoaderError::InvalidZip(self.zip_code.clone()))?;

        let mut rents = BTreeMap::new();
        for (bedrooms, rent) in (0u8..).zip(self.rents()) {
            let Some(rent) = rent else { continue };
            if rent.is_sign_negative() {
                return Err(RentTableLoaderError::NegativeRent {
                    zip,
                    bedrooms,
                    rent,
                });
            }
            rents.insert(bedrooms, rent);
        }

        let city = self
            .city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .map(str::to_string);

        Ok(MarketRentRow { zip, city, rents })
    }
}

/// Loader for market-rent data from CSV files.
///
/// Works against any [`PropertyRepository`], so the same CSV can seed
/// SQLite or the in-memory backend.
pub struct RentTableLoader;

impl RentTableLoader {
    /// Parse market-rent records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RentTableRecord>, RentTableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RentTableRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validates every record, then replaces each ZIP's rents in the
    /// repository.
    ///
    /// Nothing is written when any record is invalid. Later records for the
    /// same ZIP replace earlier ones. Returns the number of ZIPs written.
    pub async fn load<R: PropertyRepository + ?Sized>(
        repo: &R,
        records: &[RentTableRecord],
    ) -> Result<usize, RentTableLoaderError> {
        let mut rows: BTreeMap<String, MarketRentRow> = BTreeMap::new();
        for record in records {
            let row = record.to_row()?;
            rows.insert(row.zip.clone(), row);
        }

        for row in rows.values() {
            repo.upsert_market_rent(row).await?;
            debug!(zip = %row.zip, classes = row.rents.len(), "loaded market rents");
        }

        info!(zips = rows.len(), "market rents loaded");
        Ok(rows.len())
    }
}
