//! Composite gridpoint keys.
//!
//! Gridpoint ids are only unique within a region, so every per-gridpoint
//! lookup goes through a `(region, gridpoint)` pair. The backend spells the
//! same key as `"{region}-{gridpoint}"`, or just `"{gridpoint}"` for records
//! without a region.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    region: Option<String>,
    gridpoint: String,
}

impl CompositeKey {
    /// An empty region string is treated as no region.
    pub fn new(region: Option<&str>, gridpoint: &str) -> Self {
        Self {
            region: region
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            gridpoint: gridpoint.trim().to_string(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", region, self.gridpoint),
            None => f.write_str(&self.gridpoint),
        }
    }
}
