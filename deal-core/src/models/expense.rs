use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating-expense lines tracked for every property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseLine {
    WaterSewer,
    CommonElectric,
    Rubbish,
    Insurance,
    PropertyManagement,
    Repairs,
    Licensing,
    Legal,
    CapitalReserve,
    Taxes,
}

impl ExpenseLine {
    pub const ALL: [ExpenseLine; 10] = [
        Self::WaterSewer,
        Self::CommonElectric,
        Self::Rubbish,
        Self::Insurance,
        Self::PropertyManagement,
        Self::Repairs,
        Self::Licensing,
        Self::Legal,
        Self::CapitalReserve,
        Self::Taxes,
    ];

    /// Wire key, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaterSewer => "waterSewer",
            Self::CommonElectric => "commonElectric",
            Self::Rubbish => "rubbish",
            Self::Insurance => "insurance",
            Self::PropertyManagement => "propertyManagement",
            Self::Repairs => "repairs",
            Self::Licensing => "licensing",
            Self::Legal => "legal",
            Self::CapitalReserve => "capitalReserve",
            Self::Taxes => "taxes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WaterSewer => "Water & Sewer",
            Self::CommonElectric => "Common Electric",
            Self::Rubbish => "Rubbish",
            Self::Insurance => "Insurance",
            Self::PropertyManagement => "Property Management",
            Self::Repairs => "Repairs",
            Self::Licensing => "Licensing",
            Self::Legal => "Legal",
            Self::CapitalReserve => "Capital Reserve",
            Self::Taxes => "Taxes",
        }
    }

    /// Accepts the wire key, or the same key in snake or kebab case.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|line| line.as_str().to_ascii_lowercase() == normalized)
    }
}

impl fmt::Display for ExpenseLine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
