use std::path::PathBuf;

use async_trait::async_trait;
use deal_core::db::{DbConfig, PropertyRepository, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Environment variable naming the seeds directory.
pub const SEEDS_DIR_ENV: &str = "DEAL_DB_SQLITE_SEEDS_DIR";

/// Resolves the seeds directory at runtime.
///
/// 1. `DEAL_DB_SQLITE_SEEDS_DIR`, when set.
/// 2. `./seeds`, when it exists in the current directory.
/// 3. `$CARGO_MANIFEST_DIR/seeds`, for runs from the build tree.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for the `sqlite` backend.
///
/// ```rust,no_run
/// use deal_core::db::RepositoryRegistry;
/// use deal_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a file path or `:memory:`), migrates
    /// it and applies the seed files. Seeds only insert missing rows, so an
    /// existing database keeps its data.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PropertyRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
