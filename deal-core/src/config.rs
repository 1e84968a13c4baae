//! Engine defaults injected into every analysis.
//!
//! An [`EngineConfig`] deserializes from a partial document: any field left
//! out keeps its built-in default.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use deal_core::config::EngineConfig;
//!
//! let config: EngineConfig = serde_json::from_str(
//!     r#"{ "custom": { "vacancy_fraction": "0.05" } }"#,
//! ).unwrap();
//!
//! assert_eq!(config.custom.vacancy_fraction, dec!(0.05));
//! assert_eq!(config.custom.term_years, 30);
//! assert_eq!(config.listed.vacancy_fraction, dec!(0.03));
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::ExpensePolicy;
use crate::models::{AssumptionProfile, FinancingAssumptions};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Defaults for properties loaded from the listings feed.
    pub listed: FinancingAssumptions,
    /// Defaults for hand-entered properties.
    pub custom: FinancingAssumptions,
    pub expenses: ExpensePolicy,
}

impl EngineConfig {
    pub fn for_profile(
        &self,
        profile: AssumptionProfile,
    ) -> &FinancingAssumptions {
        match profile {
            AssumptionProfile::Listed => &self.listed,
            AssumptionProfile::Custom => &self.custom,
        }
    }
}
