use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use deal_core::{
    ListingId, MarketRentRow, Property, PropertyOverride, PropertyRepository, RepositoryError,
    UnitMixEntry,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use crate::decimal::{DecimalColumns, to_real};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if it does not exist.
    ///
    /// Accepts a bare path (`deals.db`), a `sqlite:` URL or `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        // Every connection to :memory: is a separate database.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        }
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `.sql` file in `seeds_dir`, in file-name order.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;

            info!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const PROPERTY_COLUMNS: &str = "listing_id, address, city, state, zip, list_price, tax, \
                                total_units, unit_mix, monthly_gross, operating_expenses";

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_property(row: &SqliteRow) -> Result<Property, RepositoryError> {
    let listing_id: String = row.try_get("listing_id").map_err(db_err)?;
    let unit_mix_json: String = row.try_get("unit_mix").map_err(db_err)?;
    let unit_mix: Vec<UnitMixEntry> = serde_json::from_str(&unit_mix_json).map_err(|e| {
        RepositoryError::Serialization(format!("unit_mix for listing {listing_id}: {e}"))
    })?;
    let total_units: i64 = row.try_get("total_units").map_err(db_err)?;

    Ok(Property {
        listing_id: ListingId::from(listing_id),
        address: row.try_get("address").map_err(db_err)?,
        city: row.try_get("city").map_err(db_err)?,
        state: row.try_get("state").map_err(db_err)?,
        zip: row.try_get("zip").map_err(db_err)?,
        list_price: row.decimal("list_price")?,
        tax: row.decimal("tax")?,
        total_units: u32::try_from(total_units).map_err(|_| {
            RepositoryError::Database(format!("total_units out of range: {total_units}"))
        })?,
        unit_mix,
        monthly_gross: row.optional_decimal("monthly_gross")?,
        operating_expenses: row.optional_decimal("operating_expenses")?,
    })
}

/// Folds `(zip, city, bedrooms, rent)` rows, sorted by ZIP, into one
/// [`MarketRentRow`] per ZIP.
fn rows_to_market_rents(rows: &[SqliteRow]) -> Result<Vec<MarketRentRow>, RepositoryError> {
    let mut by_zip: BTreeMap<String, MarketRentRow> = BTreeMap::new();

    for row in rows {
        let zip: String = row.try_get("zip").map_err(db_err)?;
        let city: Option<String> = row.try_get("city").map_err(db_err)?;
        let bedrooms: i64 = row.try_get("bedrooms").map_err(db_err)?;
        let bedrooms = u8::try_from(bedrooms)
            .map_err(|_| RepositoryError::Database(format!("bedrooms out of range: {bedrooms}")))?;
        let rent = row.decimal("rent")?;

        let entry = by_zip
            .entry(zip.clone())
            .or_insert_with(|| MarketRentRow::new(zip));
        if entry.city.is_none() {
            entry.city = city;
        }
        entry.rents.insert(bedrooms, rent);
    }

    Ok(by_zip.into_values().collect())
}

#[async_trait]
impl PropertyRepository for SqliteRepository {
    async fn get_property(
        &self,
        listing_id: &ListingId,
    ) -> Result<Property, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE listing_id = ?"
        ))
        .bind(listing_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_property(&row)
    }

    async fn list_properties(&self) -> Result<Vec<Property>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY listing_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_property).collect()
    }

    async fn upsert_property(
        &self,
        property: &Property,
    ) -> Result<(), RepositoryError> {
        let unit_mix = serde_json::to_string(&property.unit_mix)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            "INSERT INTO properties (
                listing_id, address, city, state, zip, list_price, tax,
                total_units, unit_mix, monthly_gross, operating_expenses
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (listing_id) DO UPDATE SET
                address = excluded.address,
                city = excluded.city,
                state = excluded.state,
                zip = excluded.zip,
                list_price = excluded.list_price,
                tax = excluded.tax,
                total_units = excluded.total_units,
                unit_mix = excluded.unit_mix,
                monthly_gross = excluded.monthly_gross,
                operating_expenses = excluded.operating_expenses",
        )
        .bind(property.listing_id.as_str())
        .bind(&property.address)
        .bind(&property.city)
        .bind(&property.state)
        .bind(&property.zip)
        .bind(to_real(property.list_price))
        .bind(to_real(property.tax))
        .bind(i64::from(property.total_units))
        .bind(unit_mix)
        .bind(property.monthly_gross.map(to_real))
        .bind(property.operating_expenses.map(to_real))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_market_rents(&self) -> Result<Vec<MarketRentRow>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT zip, city, bedrooms, rent FROM market_rents ORDER BY zip, bedrooms",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows_to_market_rents(&rows)
    }

    async fn get_market_rent(
        &self,
        zip: &str,
    ) -> Result<MarketRentRow, RepositoryError> {
        let rows = sqlx::query(
            "SELECT zip, city, bedrooms, rent FROM market_rents WHERE zip = ? ORDER BY bedrooms",
        )
        .bind(zip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows_to_market_rents(&rows)?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_market_rent(
        &self,
        row: &MarketRentRow,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM market_rents WHERE zip = ?")
            .bind(&row.zip)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for (bedrooms, rent) in &row.rents {
            sqlx::query("INSERT INTO market_rents (zip, city, bedrooms, rent) VALUES (?, ?, ?, ?)")
                .bind(&row.zip)
                .bind(&row.city)
                .bind(i64::from(*bedrooms))
                .bind(to_real(*rent))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_override(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<PropertyOverride>, RepositoryError> {
        let row = sqlx::query("SELECT payload FROM property_overrides WHERE listing_id = ?")
            .bind(listing_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("payload").map_err(db_err)?;
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(format!("override for {listing_id}: {e}")))
    }

    async fn save_override(
        &self,
        listing_id: &ListingId,
        overrides: &PropertyOverride,
    ) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(overrides)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            "INSERT INTO property_overrides (listing_id, payload, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (listing_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
        )
        .bind(listing_id.as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        debug!(listing = %listing_id, "saved override");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use deal_core::ExpenseLine;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn test_property() -> Property {
        Property {
            listing_id: ListingId::from("73100001"),
            address: "41 Greenwich St".to_string(),
            city: "Dorchester".to_string(),
            state: "MA".to_string(),
            zip: "02124".to_string(),
            list_price: dec!(1150000),
            tax: dec!(9850),
            total_units: 3,
            unit_mix: vec![
                UnitMixEntry::new(2, 1),
                UnitMixEntry::new(3, 2).with_rent(dec!(3300)),
            ],
            monthly_gross: Some(dec!(8700)),
            operating_expenses: None,
        }
    }

    // =========================================================================
    // property tests
    // =========================================================================

    #[tokio::test]
    async fn property_round_trips() {
        let repo = setup_test_db().await;
        let property = test_property();

        repo.upsert_property(&property).await.unwrap();
        let stored = repo.get_property(&property.listing_id).await.unwrap();

        assert_eq!(stored, property);
    }

    #[tokio::test]
    async fn upsert_property_updates_existing_row() {
        let repo = setup_test_db().await;
        let mut property = test_property();
        repo.upsert_property(&property).await.unwrap();

        property.list_price = dec!(1099000);
        property.operating_expenses = Some(dec!(14200));
        repo.upsert_property(&property).await.unwrap();

        let all = repo.list_properties().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].list_price, dec!(1099000));
        assert_eq!(all[0].operating_expenses, Some(dec!(14200)));
    }

    #[tokio::test]
    async fn missing_property_is_not_found() {
        let repo = setup_test_db().await;

        let result = repo.get_property(&ListingId::from("00000000")).await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn corrupt_unit_mix_is_serialization_error() {
        let repo = setup_test_db().await;
        sqlx::query(
            "INSERT INTO properties (listing_id, zip, list_price, tax, total_units, unit_mix)
             VALUES ('bad', '02124', 1, 1, 1, 'not json')",
        )
        .execute(repo.pool())
        .await
        .expect("Failed to insert test property");

        let result = repo.get_property(&ListingId::from("bad")).await;

        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }

    // =========================================================================
    // market rent tests
    // =========================================================================

    #[tokio::test]
    async fn market_rent_round_trips_by_zip() {
        let repo = setup_test_db().await;
        let mut row = MarketRentRow::new("02124")
            .with_rent(0, dec!(2212))
            .with_rent(2, dec!(2827))
            .with_rent(6, dec!(4894));
        row.city = Some("Boston - Dorchester".to_string());

        repo.upsert_market_rent(&row).await.unwrap();

        assert_eq!(repo.get_market_rent("02124").await.unwrap(), row);
        assert_eq!(
            repo.get_market_rent("02134").await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn upsert_market_rent_replaces_previous_rents() {
        let repo = setup_test_db().await;
        repo.upsert_market_rent(
            &MarketRentRow::new("02134")
                .with_rent(1, dec!(2500))
                .with_rent(2, dec!(3000)),
        )
        .await
        .unwrap();

        repo.upsert_market_rent(&MarketRentRow::new("02134").with_rent(2, dec!(3100)))
            .await
            .unwrap();

        let row = repo.get_market_rent("02134").await.unwrap();
        assert_eq!(row.rents.len(), 1);
        assert_eq!(row.rents[&2], dec!(3100));
    }

    #[tokio::test]
    async fn rent_table_spans_all_zips() {
        let repo = setup_test_db().await;
        repo.upsert_market_rent(&MarketRentRow::new("02124").with_rent(2, dec!(2827)))
            .await
            .unwrap();
        repo.upsert_market_rent(&MarketRentRow::new("02134").with_rent(2, dec!(3100)))
            .await
            .unwrap();

        let table = repo.load_rent_table().await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("02134", 2), Some(dec!(3100)));
        assert_eq!(table.lookup("02124", 9), None);
    }

    // =========================================================================
    // override tests
    // =========================================================================

    #[tokio::test]
    async fn override_absent_until_saved() {
        let repo = setup_test_db().await;

        let result = repo.get_override(&ListingId::Custom).await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn override_round_trips_and_last_write_wins() {
        let repo = setup_test_db().await;
        let listing = ListingId::from("73100001");
        let first = PropertyOverride::default().with_offer_price(dec!(1100000));
        let second = first
            .clone()
            .with_expense(ExpenseLine::Insurance, dec!(3200))
            .with_unit_mix(vec![UnitMixEntry::new(3, 3).with_rent(dec!(3350))]);

        repo.save_override(&listing, &first).await.unwrap();
        repo.save_override(&listing, &second).await.unwrap();

        assert_eq!(repo.get_override(&listing).await, Ok(Some(second)));
    }

    #[tokio::test]
    async fn stored_payload_is_camel_case_json() {
        let repo = setup_test_db().await;
        let record = PropertyOverride::default().with_down_payment(dec!(0.25));
        repo.save_override(&ListingId::Custom, &record).await.unwrap();

        let payload: String =
            sqlx::query_scalar("SELECT payload FROM property_overrides WHERE listing_id = 'CUSTOM'")
                .fetch_one(repo.pool())
                .await
                .expect("Failed to read payload");

        assert_eq!(payload, r#"{"downPayment":"0.25"}"#);
    }

    // =========================================================================
    // seed tests
    // =========================================================================

    #[tokio::test]
    async fn seeds_load_sample_data() {
        let repo = setup_test_db().await;

        repo.run_seeds(&Path::new(env!("CARGO_MANIFEST_DIR")).join("seeds"))
            .await
            .expect("Failed to run seeds");

        let rent = repo.get_market_rent("02124").await.unwrap();
        assert_eq!(rent.rents[&2], dec!(2827));
        let property = repo.get_property(&ListingId::from("73100001")).await.unwrap();
        assert_eq!(property.unit_mix, vec![UnitMixEntry::new(3, 3)]);
    }

    #[tokio::test]
    async fn seeds_are_idempotent() {
        let repo = setup_test_db().await;
        let seeds = Path::new(env!("CARGO_MANIFEST_DIR")).join("seeds");

        repo.run_seeds(&seeds).await.unwrap();
        repo.run_seeds(&seeds).await.unwrap();

        assert_eq!(repo.list_properties().await.unwrap().len(), 4);
    }
}
