use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{PropertyRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is handed to that factory as is.
///
/// | backend  | connection_string examples    |
/// |----------|-------------------------------|
/// | `sqlite` | `deals.db`, `:memory:`        |
/// | `memory` | ignored                       |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "deals.db".to_string(),
        }
    }
}

/// One implementation per storage backend, registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens (or creates) the store and returns a ready repository.
    /// Implementations may run migrations here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PropertyRepository>, RepositoryError>;
}

/// [`RepositoryFactory`] instances keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a backend, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory has that name.
    /// * Any error the chosen factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PropertyRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::memory::{MemoryRepository, MemoryRepositoryFactory};

    /// Flips a flag when `create` is reached.
    struct FlagFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for FlagFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn PropertyRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(MemoryRepository::new()))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn PropertyRepository>, RepositoryError> {
            Err(RepositoryError::Connection("intentional failure".to_string()))
        }
    }

    fn flag_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(FlagFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // =========================================================================
    // DbConfig tests
    // =========================================================================

    #[test]
    fn dbconfig_default_is_sqlite_file() {
        let cfg = DbConfig::default();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "deals.db");
    }

    // =========================================================================
    // registration tests
    // =========================================================================

    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, _) = flag_factory("sqlite");
        reg.register(sqlite);
        reg.register(Box::new(MemoryRepositoryFactory));

        assert_eq!(reg.available_backends(), vec!["memory", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::new();
        let (old, _) = flag_factory("sqlite");
        let (new, _) = flag_factory("sqlite");
        reg.register(old);
        reg.register(new);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // =========================================================================
    // create tests
    // =========================================================================

    #[tokio::test]
    async fn create_calls_only_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = flag_factory("sqlite");
        let (postgres, postgres_called) = flag_factory("postgres");
        reg.register(sqlite);
        reg.register(postgres);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn memory_backend_opens_empty_repository() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(MemoryRepositoryFactory));

        let repo = reg.create(&config("memory")).await.unwrap();

        assert!(repo.list_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(MemoryRepositoryFactory));

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("memory"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config("failing")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(msg)) if msg == "intentional failure"
        ));
    }
}
