//! In-process repository backend.
//!
//! Holds everything in memory for the lifetime of the process. Useful for
//! one-off analyses that should not touch a database file, and in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{PropertyRepository, RepositoryError};
use crate::models::{ListingId, MarketRentRow, Property, PropertyOverride};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    properties: RwLock<BTreeMap<ListingId, Property>>,
    market_rents: RwLock<BTreeMap<String, MarketRentRow>>,
    overrides: RwLock<BTreeMap<ListingId, PropertyOverride>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PropertyRepository for MemoryRepository {
    async fn get_property(
        &self,
        listing_id: &ListingId,
    ) -> Result<Property, RepositoryError> {
        self.properties
            .read()
            .await
            .get(listing_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_properties(&self) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.properties.read().await.values().cloned().collect())
    }

    async fn upsert_property(
        &self,
        property: &Property,
    ) -> Result<(), RepositoryError> {
        self.properties
            .write()
            .await
            .insert(property.listing_id.clone(), property.clone());
        Ok(())
    }

    async fn list_market_rents(&self) -> Result<Vec<MarketRentRow>, RepositoryError> {
        Ok(self.market_rents.read().await.values().cloned().collect())
    }

    async fn get_market_rent(
        &self,
        zip: &str,
    ) -> Result<MarketRentRow, RepositoryError> {
        self.market_rents
            .read()
            .await
            .get(zip)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_market_rent(
        &self,
        row: &MarketRentRow,
    ) -> Result<(), RepositoryError> {
        self.market_rents
            .write()
            .await
            .insert(row.zip.clone(), row.clone());
        Ok(())
    }

    async fn get_override(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<PropertyOverride>, RepositoryError> {
        Ok(self.overrides.read().await.get(listing_id).cloned())
    }

    async fn save_override(
        &self,
        listing_id: &ListingId,
        overrides: &PropertyOverride,
    ) -> Result<(), RepositoryError> {
        self.overrides
            .write()
            .await
            .insert(listing_id.clone(), overrides.clone());
        Ok(())
    }
}

/// Registers the `memory` backend. The connection string is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn PropertyRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
