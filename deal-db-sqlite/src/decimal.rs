//! Money columns.
//!
//! Amounts are written as `REAL` but a column may come back as `INTEGER` when
//! SQLite stores a whole number, or as `TEXT` when a seed file quotes it.

use std::str::FromStr;

use deal_core::RepositoryError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Typed access to decimal columns of a SQLite row.
pub trait DecimalColumns {
    /// Reads a required column. `NULL` is an error.
    fn decimal(
        &self,
        column: &str,
    ) -> Result<Decimal, RepositoryError>;

    /// Reads a nullable column.
    fn optional_decimal(
        &self,
        column: &str,
    ) -> Result<Option<Decimal>, RepositoryError>;
}

impl DecimalColumns for SqliteRow {
    fn decimal(
        &self,
        column: &str,
    ) -> Result<Decimal, RepositoryError> {
        self.optional_decimal(column)?
            .ok_or_else(|| RepositoryError::Database(format!("Column '{column}' is NULL")))
    }

    fn optional_decimal(
        &self,
        column: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let value = self
            .try_get_raw(column)
            .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))?;

        if value.is_null() {
            return Ok(None);
        }

        let type_name = value.type_info().name().to_string();
        let read_err =
            |e: sqlx::Error| RepositoryError::Database(format!("Failed to read '{column}': {e}"));

        let decimal = match type_name.as_str() {
            "INTEGER" => Decimal::from(self.try_get::<i64, _>(column).map_err(read_err)?),
            "REAL" => {
                let raw: f64 = self.try_get(column).map_err(read_err)?;
                Decimal::try_from(raw).map_err(|e| {
                    RepositoryError::Database(format!("Column '{column}' holds {raw}: {e}"))
                })?
            }
            "TEXT" => {
                let raw: String = self.try_get(column).map_err(read_err)?;
                Decimal::from_str(raw.trim()).map_err(|e| {
                    RepositoryError::Database(format!("Column '{column}' holds '{raw}': {e}"))
                })?
            }
            other => {
                return Err(RepositoryError::Database(format!(
                    "Unexpected type '{other}' for column '{column}'"
                )));
            }
        };

        Ok(Some(decimal))
    }
}

/// Value to bind for a `REAL` money column.
pub fn to_real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
