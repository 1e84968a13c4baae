use serde::{Deserialize, Serialize};

use super::{Property, PropertyOverride};

/// Full property and override state captured after one mutation.
///
/// Both halves are owned copies, so later edits to the live state never reach
/// a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub property: Property,
    pub overrides: PropertyOverride,
}

impl AnalysisSnapshot {
    pub fn capture(
        property: &Property,
        overrides: &PropertyOverride,
    ) -> Self {
        Self {
            property: property.clone(),
            overrides: overrides.clone(),
        }
    }
}
