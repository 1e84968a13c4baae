pub mod calculations;
pub mod config;
pub mod db;
pub mod models;
pub mod session;

pub use calculations::{DealAnalysis, Underwriter};
pub use config::EngineConfig;
pub use db::repository::{PropertyRepository, RepositoryError};
pub use models::*;
pub use session::{DealSession, Edit, HistoryStack, OverrideStore, SessionError};
