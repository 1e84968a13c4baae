use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ListingId, MarketRentRow, Property, PropertyOverride, RentTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    // Properties
    async fn get_property(
        &self,
        listing_id: &ListingId,
    ) -> Result<Property, RepositoryError>;
    async fn list_properties(&self) -> Result<Vec<Property>, RepositoryError>;
    async fn upsert_property(
        &self,
        property: &Property,
    ) -> Result<(), RepositoryError>;

    // Market rents
    async fn list_market_rents(&self) -> Result<Vec<MarketRentRow>, RepositoryError>;
    async fn get_market_rent(
        &self,
        zip: &str,
    ) -> Result<MarketRentRow, RepositoryError>;
    async fn upsert_market_rent(
        &self,
        row: &MarketRentRow,
    ) -> Result<(), RepositoryError>;

    // Overrides
    async fn get_override(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<PropertyOverride>, RepositoryError>;
    async fn save_override(
        &self,
        listing_id: &ListingId,
        overrides: &PropertyOverride,
    ) -> Result<(), RepositoryError>;

    /// Every stored market-rent row, indexed for lookup.
    async fn load_rent_table(&self) -> Result<RentTable, RepositoryError> {
        Ok(RentTable::from_rows(self.list_market_rents().await?))
    }
}
