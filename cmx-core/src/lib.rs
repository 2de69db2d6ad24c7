//! Core types and backend client for exploring GCM/RCM comparison results.
//!
//! - `variable`: the physical variables the backend publishes results for
//! - `key`: composite (region, gridpoint) keys
//! - `grid_point`: per-gridpoint records returned by `load_csv` and `best_models`
//! - `region`: the embedded region bounding-box table
//! - `query`: backend endpoints, their parameters and decoded payloads
//! - `client`: reqwest client for the backend (`api` feature)

pub mod error;
pub mod grid_point;
pub mod key;
pub mod query;
pub mod region;
pub mod variable;
mod wire;

#[cfg(feature = "api")]
pub mod client;

pub use error::{FetchError, FixtureError};
pub use grid_point::{BestModelRecord, GridPoint};
pub use key::CompositeKey;
pub use query::{DataScope, EquivalencePayload, Payload, Query};
pub use region::{BoundingBox, RegionBounds, RegionBoundsTable};
pub use variable::PhysicalVariable;

/// Which model axis a color map, equivalence set or filter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelAxis {
    Gcm,
    Rcm,
}

impl ModelAxis {
    pub fn label(&self) -> &'static str {
        match self {
            ModelAxis::Gcm => "GCM",
            ModelAxis::Rcm => "RCM",
        }
    }
}
