use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A physical variable the comparison results are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalVariable {
    /// Precipitation
    Ppt,
    /// Near-surface air temperature
    Tas,
}

impl PhysicalVariable {
    pub const ALL: [PhysicalVariable; 2] = [PhysicalVariable::Ppt, PhysicalVariable::Tas];

    /// Value of the `physical_variable` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicalVariable::Ppt => "ppt",
            PhysicalVariable::Tas => "tas",
        }
    }

    /// Human-readable selector label.
    pub fn label(&self) -> &'static str {
        match self {
            PhysicalVariable::Ppt => "Precipitation (ppt)",
            PhysicalVariable::Tas => "Temperature (tas)",
        }
    }
}

impl fmt::Display for PhysicalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhysicalVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ppt" => Ok(PhysicalVariable::Ppt),
            "tas" => Ok(PhysicalVariable::Tas),
            other => Err(format!(
                "unknown physical variable '{}' (expected ppt or tas)",
                other
            )),
        }
    }
}
