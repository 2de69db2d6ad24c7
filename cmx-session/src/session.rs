//! One user's exploration session.

use crate::derived::DerivedData;
use crate::orchestrator::{Completion, DataOrchestrator, FetchStats, Outcome, PendingFetch};
use crate::render::{self, MapView};
use crate::state::{Action, SelectionError, SelectionState};
use cmx_core::{ModelAxis, RegionBoundsTable};
use log::debug;

/// Selection state, the data derived from it, and the orchestrator that
/// keeps the two consistent.
#[derive(Debug, Clone)]
pub struct Session {
    state: SelectionState,
    derived: DerivedData,
    catalogue: Option<Vec<String>>,
    bounds: RegionBoundsTable,
    orchestrator: DataOrchestrator,
}

impl Session {
    pub fn new(bounds: RegionBoundsTable) -> Self {
        Self {
            state: SelectionState::new(),
            derived: DerivedData::default(),
            catalogue: None,
            bounds,
            orchestrator: DataOrchestrator::new(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn derived(&self) -> &DerivedData {
        &self.derived
    }

    /// Regions known to the backend, once `list_regions` has answered.
    pub fn catalogue(&self) -> Option<&[String]> {
        self.catalogue.as_deref()
    }

    pub fn stats(&self) -> FetchStats {
        self.orchestrator.stats()
    }

    /// Fetches to run when the session opens.
    pub fn start(&mut self) -> Vec<PendingFetch> {
        self.orchestrator.on_session_start()
    }

    /// Apply a user action and return the fetches it requires.
    ///
    /// A rejected action leaves the session untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<PendingFetch>, SelectionError> {
        debug!("Dispatching {:?}", action);
        let next = self.state.apply(action)?;
        if next.generation() != self.state.generation() {
            self.derived.clear();
        }
        let fetches = self.orchestrator.on_state_change(&self.state, &next);
        self.state = next;
        Ok(fetches)
    }

    /// Hand a finished fetch to the staleness guard.
    pub fn complete(&mut self, completion: Completion) -> Outcome {
        self.orchestrator.apply(
            &mut self.state,
            &mut self.derived,
            &mut self.catalogue,
            completion,
        )
    }

    pub fn filter_options(&self, axis: ModelAxis) -> Vec<String> {
        self.derived.filter_options(axis)
    }

    pub fn render(&self) -> MapView {
        render::render(&self.state, &self.derived, &self.bounds)
    }
}
