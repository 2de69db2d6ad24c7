//! Fetch planning and the staleness guard.
//!
//! [`DataOrchestrator::on_state_change`] compares two states and returns the
//! fetches the change implies, each tagged with the generation it was
//! issued under. [`DataOrchestrator::apply`] writes a completed fetch into
//! its slice only when that tag still matches the live generation.

use crate::derived::{BestModels, DerivedData};
use crate::state::SelectionState;
use cmx_core::{DataScope, FetchError, Payload, Query};
use cmx_data::EquivalenceIndex;
use log::{debug, info, warn};
use serde::Serialize;

/// Lifetime a fetch result is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FetchScope {
    /// Valid for the whole session (the region catalogue)
    Session,
    /// Valid only while the selection is at this generation
    Generation(u64),
}

/// A fetch that has been decided on but not yet run.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub scope: FetchScope,
    pub query: Query,
}

/// A finished fetch, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub scope: FetchScope,
    pub query: Query,
    pub result: Result<Payload, FetchError>,
}

/// The piece of state a fetch feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Slice {
    Catalogue,
    Metrics,
    Regions,
    Points,
    BestModels,
    Equivalence,
}

impl Slice {
    pub fn of(query: &Query) -> Self {
        match query {
            Query::Regions => Slice::Catalogue,
            Query::Metrics { .. } => Slice::Metrics,
            Query::RegionsForMetric { .. } => Slice::Regions,
            Query::Points(_) => Slice::Points,
            Query::BestModels(_) => Slice::BestModels,
            Query::Equivalence(_) => Slice::Equivalence,
        }
    }
}

/// What applying a completion did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(Slice),
    /// The fetch failed and its slice was cleared
    Cleared { slice: Slice, error: FetchError },
    /// The fetch belonged to an older generation
    Discarded { slice: Slice, issued: u64, live: u64 },
}

/// Counters for the fetches a session has issued and resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FetchStats {
    pub issued: u64,
    pub applied: u64,
    pub failed: u64,
    pub discarded: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DataOrchestrator {
    stats: FetchStats,
}

impl DataOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Fetches issued once when a session opens.
    pub fn on_session_start(&mut self) -> Vec<PendingFetch> {
        self.issue(vec![PendingFetch {
            scope: FetchScope::Session,
            query: Query::Regions,
        }])
    }

    /// Minimal set of fetches implied by moving from `prev` to `next`.
    ///
    /// - variable changed: metric list (nothing when the variable was cleared)
    /// - metric changed: region list, points, best models, equivalence
    /// - region changed: points, best models, equivalence, scoped to the region
    ///
    /// Mode and filter changes never fetch.
    pub fn on_state_change(&mut self, prev: &SelectionState, next: &SelectionState) -> Vec<PendingFetch> {
        if prev.generation() == next.generation() {
            return Vec::new();
        }
        let scope = FetchScope::Generation(next.generation());
        let mut queries: Vec<Query> = Vec::new();

        if prev.variable() != next.variable() {
            if let Some(variable) = next.variable() {
                queries.push(Query::Metrics {
                    variable,
                    region: None,
                });
            }
        } else if prev.metric() != next.metric() {
            if let (Some(variable), Some(metric)) = (next.variable(), next.metric()) {
                queries.push(Query::RegionsForMetric {
                    variable,
                    metric: metric.to_string(),
                });
                queries.extend(data_queries(next));
            }
        } else if prev.region() != next.region() {
            queries.extend(data_queries(next));
        }

        self.issue(
            queries
                .into_iter()
                .map(|query| PendingFetch { scope, query })
                .collect(),
        )
    }

    fn issue(&mut self, fetches: Vec<PendingFetch>) -> Vec<PendingFetch> {
        self.stats.issued += fetches.len() as u64;
        for fetch in &fetches {
            debug!("Issuing {} ({:?})", fetch.query.endpoint(), fetch.scope);
        }
        fetches
    }

    /// Apply a completed fetch if it is still valid for `state`.
    ///
    /// Success replaces the slice; failure clears it. Nothing else is
    /// touched either way, except that a failed region list falls back to
    /// the session catalogue so a region can still be chosen.
    pub fn apply(
        &mut self,
        state: &mut SelectionState,
        derived: &mut DerivedData,
        catalogue: &mut Option<Vec<String>>,
        completion: Completion,
    ) -> Outcome {
        let slice = Slice::of(&completion.query);
        if let FetchScope::Generation(issued) = completion.scope {
            let live = state.generation();
            if issued != live {
                self.stats.discarded += 1;
                debug!(
                    "Discarding stale {} response (generation {} < {})",
                    completion.query.endpoint(),
                    issued,
                    live
                );
                return Outcome::Discarded { slice, issued, live };
            }
        }

        let payload = match completion.result {
            Ok(payload) if Slice::of(&completion.query) == slice_of_payload(&payload) => payload,
            Ok(payload) => {
                let error = FetchError::Decode {
                    endpoint: completion.query.endpoint(),
                    message: format!("unexpected {} payload", payload.kind()),
                };
                return self.clear(state, derived, catalogue, slice, error);
            }
            Err(error) => return self.clear(state, derived, catalogue, slice, error),
        };

        match payload {
            Payload::Regions(regions) => {
                info!("Region catalogue: {} regions", regions.len());
                *catalogue = Some(regions);
            }
            Payload::Metrics(metrics) => {
                info!("Loaded {} metrics", metrics.len());
                state.offer_metrics(metrics);
            }
            Payload::RegionsForMetric(regions) => {
                info!("Loaded {} regions for metric", regions.len());
                state.offer_regions(regions);
            }
            Payload::Points(points) => {
                info!("Loaded {} gridpoints", points.len());
                derived.points = Some(points);
            }
            Payload::BestModels(records) => {
                let best = BestModels::new(records);
                info!(
                    "Loaded {} best-model records ({} GCMs, {} RCMs)",
                    best.records.len(),
                    best.gcm_colors.len(),
                    best.rcm_colors.len()
                );
                derived.best_models = Some(best);
            }
            Payload::Equivalence(raw) => {
                derived.equivalence = Some(EquivalenceIndex::build(&raw));
            }
        }
        self.stats.applied += 1;
        Outcome::Applied(slice)
    }

    fn clear(
        &mut self,
        state: &mut SelectionState,
        derived: &mut DerivedData,
        catalogue: &mut Option<Vec<String>>,
        slice: Slice,
        error: FetchError,
    ) -> Outcome {
        warn!("Fetch failed, clearing {:?}: {}", slice, error);
        self.stats.failed += 1;
        match slice {
            Slice::Catalogue => *catalogue = None,
            Slice::Metrics => state.offer_metrics(Vec::new()),
            Slice::Regions => state.offer_regions(catalogue.clone().unwrap_or_default()),
            Slice::Points => derived.points = None,
            Slice::BestModels => derived.best_models = None,
            Slice::Equivalence => derived.equivalence = None,
        }
        Outcome::Cleared { slice, error }
    }
}

fn data_queries(state: &SelectionState) -> Vec<Query> {
    match (state.variable(), state.metric()) {
        (Some(variable), Some(metric)) => {
            let scope = DataScope {
                variable,
                metric: metric.to_string(),
                region: state.region().map(str::to_string),
            };
            vec![
                Query::Points(scope.clone()),
                Query::BestModels(scope.clone()),
                Query::Equivalence(scope),
            ]
        }
        _ => Vec::new(),
    }
}

fn slice_of_payload(payload: &Payload) -> Slice {
    match payload {
        Payload::Regions(_) => Slice::Catalogue,
        Payload::Metrics(_) => Slice::Metrics,
        Payload::RegionsForMetric(_) => Slice::Regions,
        Payload::Points(_) => Slice::Points,
        Payload::BestModels(_) => Slice::BestModels,
        Payload::Equivalence(_) => Slice::Equivalence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Action, VisualizationMode};
    use crate::testing::{best, point};
    use cmx_core::PhysicalVariable;

    struct Harness {
        orchestrator: DataOrchestrator,
        state: SelectionState,
        derived: DerivedData,
        catalogue: Option<Vec<String>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                orchestrator: DataOrchestrator::new(),
                state: SelectionState::new(),
                derived: DerivedData::default(),
                catalogue: None,
            }
        }

        fn act(&mut self, action: Action) -> Vec<PendingFetch> {
            let next = self.state.apply(action).unwrap();
            let fetches = self.orchestrator.on_state_change(&self.state, &next);
            self.state = next;
            fetches
        }

        fn complete(&mut self, fetch: &PendingFetch, result: Result<Payload, FetchError>) -> Outcome {
            self.orchestrator.apply(
                &mut self.state,
                &mut self.derived,
                &mut self.catalogue,
                Completion {
                    scope: fetch.scope,
                    query: fetch.query.clone(),
                    result,
                },
            )
        }
    }

    fn endpoints(fetches: &[PendingFetch]) -> Vec<&'static str> {
        fetches.iter().map(|f| f.query.endpoint()).collect()
    }

    #[test]
    fn test_variable_change_fetches_metrics_only() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        assert_eq!(endpoints(&fetches), vec!["list_metrics"]);
        assert_eq!(fetches[0].scope, FetchScope::Generation(1));
    }

    #[test]
    fn test_clearing_variable_fetches_nothing() {
        let mut h = Harness::new();
        h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        assert!(h.act(Action::SetVariable(None)).is_empty());
    }

    #[test]
    fn test_metric_change_fetches_regions_and_data() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        assert_eq!(
            endpoints(&fetches),
            vec!["list_regions_for_metric", "load_csv", "best_models", "equivalent_best_models"]
        );
        assert!(fetches.iter().all(|f| f.scope == FetchScope::Generation(2)));
    }

    #[test]
    fn test_region_change_fetches_scoped_data() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Tas)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        h.complete(&fetches[0], Ok(Payload::RegionsForMetric(vec!["AL".into()])));
        let fetches = h.act(Action::SetRegion(Some("AL".into())));
        assert_eq!(endpoints(&fetches), vec!["load_csv", "best_models", "equivalent_best_models"]);
        match &fetches[0].query {
            Query::Points(scope) => assert_eq!(scope.region.as_deref(), Some("AL")),
            other => panic!("unexpected query {:?}", other),
        }
    }

    #[test]
    fn test_mode_change_fetches_nothing() {
        let mut h = Harness::new();
        h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        assert!(h.act(Action::SetMode(VisualizationMode::BestRcm)).is_empty());
        assert!(h.act(Action::SetRcmFilter(Some("RACMO".into()))).is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut h = Harness::new();
        let first = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        let second = h.act(Action::SetVariable(Some(PhysicalVariable::Tas)));
        let outcome = h.complete(&first[0], Ok(Payload::Metrics(vec!["ppt-only".into()])));
        assert_eq!(
            outcome,
            Outcome::Discarded {
                slice: Slice::Metrics,
                issued: 1,
                live: 2
            }
        );
        assert!(h.state.available_metrics().is_empty());
        let outcome = h.complete(&second[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        assert_eq!(outcome, Outcome::Applied(Slice::Metrics));
        assert_eq!(h.state.available_metrics(), &["RMSE".to_string()]);
        assert_eq!(h.orchestrator.stats().discarded, 1);
    }

    #[test]
    fn test_failure_clears_only_its_slice() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        h.complete(&fetches[0], Ok(Payload::RegionsForMetric(vec!["BI".into()])));
        h.complete(&fetches[1], Ok(Payload::Points(vec![point(Some("BI"), "1", 51.0, 0.0)])));
        h.complete(&fetches[2], Ok(Payload::BestModels(vec![best(Some("BI"), "1", Some("A"), None)])));

        let error = FetchError::Status {
            endpoint: "best_models",
            status: 500,
        };
        // A second best_models response for the same generation fails
        let outcome = h.complete(&fetches[2], Err(error.clone()));
        assert_eq!(
            outcome,
            Outcome::Cleared {
                slice: Slice::BestModels,
                error
            }
        );
        assert!(h.derived.best_models.is_none());
        assert_eq!(h.derived.points.as_ref().map(Vec::len), Some(1));
        assert_eq!(h.state.available_metrics().len(), 1);
        assert_eq!(h.state.available_regions().len(), 1);
        assert_eq!(h.state.metric(), Some("RMSE"));
    }

    #[test]
    fn test_session_scope_survives_generation_changes() {
        let mut h = Harness::new();
        let start = h.orchestrator.on_session_start();
        h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        h.act(Action::SetVariable(Some(PhysicalVariable::Tas)));
        let outcome = h.complete(&start[0], Ok(Payload::Regions(vec!["BI".into(), "FR".into()])));
        assert_eq!(outcome, Outcome::Applied(Slice::Catalogue));
        assert_eq!(h.catalogue.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_mismatched_payload_is_a_failure() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        let outcome = h.complete(&fetches[0], Ok(Payload::Points(Vec::new())));
        assert!(matches!(outcome, Outcome::Cleared { slice: Slice::Metrics, .. }));
    }

    #[test]
    fn test_equivalence_keys_are_composite() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        let raw: cmx_core::EquivalencePayload = serde_json::from_value(serde_json::json!({
            "equivalent_best_gcms": {"BI-1": ["A"], "FR-1": ["B"]},
            "equivalent_best_rcms": {}
        }))
        .unwrap();
        h.complete(&fetches[3], Ok(Payload::Equivalence(raw)));
        let index = h.derived.equivalence.as_ref().unwrap();
        assert_eq!(index.lookup(Some("BI"), "1", cmx_core::ModelAxis::Gcm).len(), 1);
        assert!(index.lookup(Some("FR"), "1", cmx_core::ModelAxis::Gcm).contains("B"));
    }

    fn equivalence_payload(value: serde_json::Value) -> Payload {
        Payload::Equivalence(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_equivalence_lookup_independent_of_arrival_order() {
        for equivalence_first in [false, true] {
            let mut h = Harness::new();
            let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
            h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
            let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
            let regions = Ok(Payload::RegionsForMetric(vec!["NEU".into()]));
            let equivalence = Ok(equivalence_payload(serde_json::json!({
                "equivalent_best_gcms": {"NEU-1": ["A"]}
            })));
            if equivalence_first {
                h.complete(&fetches[3], equivalence);
                h.complete(&fetches[0], regions);
            } else {
                h.complete(&fetches[0], regions);
                h.complete(&fetches[3], equivalence);
            }
            let index = h.derived.equivalence.as_ref().unwrap();
            assert_eq!(
                index.lookup(Some("NEU"), "1", cmx_core::ModelAxis::Gcm).len(),
                1,
                "equivalence first: {}",
                equivalence_first
            );
        }
    }

    #[test]
    fn test_failed_region_list_falls_back_to_catalogue() {
        let mut h = Harness::new();
        let start = h.orchestrator.on_session_start();
        h.complete(&start[0], Ok(Payload::Regions(vec!["BI".into(), "NEU".into()])));
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Ppt)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        let outcome = h.complete(
            &fetches[0],
            Err(FetchError::Status {
                endpoint: "list_regions_for_metric",
                status: 500,
            }),
        );
        assert!(matches!(outcome, Outcome::Cleared { slice: Slice::Regions, .. }));
        assert_eq!(h.state.available_regions(), &["BI".to_string(), "NEU".to_string()]);
        let fetches = h.act(Action::SetRegion(Some("NEU".into())));
        assert_eq!(fetches.len(), 3);
    }

    #[test]
    fn test_failed_region_list_without_catalogue_offers_nothing() {
        let mut h = Harness::new();
        let fetches = h.act(Action::SetVariable(Some(PhysicalVariable::Tas)));
        h.complete(&fetches[0], Ok(Payload::Metrics(vec!["RMSE".into()])));
        let fetches = h.act(Action::SetMetric(Some("RMSE".into())));
        h.complete(
            &fetches[0],
            Err(FetchError::Transport {
                endpoint: "list_regions_for_metric",
                message: "connection reset".into(),
            }),
        );
        assert!(h.state.available_regions().is_empty());
    }
}
