pub mod factory;
pub mod memory;
pub mod repository;
pub mod sink;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{MemoryRepository, MemoryRepositoryFactory};
pub use repository::{PropertyRepository, RepositoryError};
pub use sink::{OverrideSink, RepositorySink};
