//! Selection state machine and render pipeline for the model comparison map.
//!
//! This crate provides:
//! - `state`: `SelectionState`, the cascading variable → metric → region selector
//! - `derived`: data slices populated by backend responses
//! - `orchestrator`: which fetches a transition needs, and the staleness guard
//! - `session`: state, derived data and orchestrator bundled per user session
//! - `driver`: async event loop running fetches against a `Backend`
//! - `render`: `MapView` markers, legend and viewport

pub mod derived;
pub mod driver;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod state;

pub use derived::{BestModels, DerivedData};
pub use driver::{Backend, Driver};
pub use orchestrator::{Completion, DataOrchestrator, FetchScope, Outcome, PendingFetch, Slice};
pub use render::{LegendEntry, MapView, Marker};
pub use session::Session;
pub use state::{Action, SelectionError, SelectionState, VisualizationMode};

#[cfg(test)]
pub(crate) mod testing;
