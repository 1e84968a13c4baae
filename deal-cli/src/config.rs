//! Optional TOML configuration for the `deal` binary.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "deals.db"
//!
//! [engine.listed]
//! interest_rate = "0.0675"
//!
//! [engine.expenses]
//! insurance = "4200"
//! ```
//!
//! Every section and field is optional.

use std::path::Path;

use anyhow::{Context, Result};
use deal_core::EngineConfig;
use deal_core::db::DbConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse: {}", path.display()))
    }
}
