//! Async event loop for a session.
//!
//! The driver runs on a single thread. Every fetch a transition needs is
//! pushed onto a `FuturesUnordered` set and polled concurrently; completions
//! are handed to the session one at a time, so state is only ever touched
//! between awaits. In-flight requests are never cancelled: a superseded
//! response is dropped by the staleness guard when it lands.

use crate::orchestrator::{Completion, Outcome, PendingFetch};
use crate::render::MapView;
use crate::session::Session;
use crate::state::{Action, SelectionError};
use cmx_core::{FetchError, Payload, Query};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use log::warn;
use std::future::Future;
use std::time::Duration;

/// Something that can answer backend queries.
pub trait Backend {
    fn execute(&self, query: &Query) -> impl Future<Output = Result<Payload, FetchError>>;
}

#[cfg(feature = "api")]
impl Backend for cmx_core::client::BackendClient {
    fn execute(&self, query: &Query) -> impl Future<Output = Result<Payload, FetchError>> {
        cmx_core::client::BackendClient::execute(self, query)
    }
}

pub struct Driver<B> {
    backend: B,
    timeout: Duration,
    session: Session,
    inflight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
}

impl<B> Driver<B>
where
    B: Backend + Clone + 'static,
{
    pub fn new(backend: B, session: Session, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            session,
            inflight: FuturesUnordered::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn render(&self) -> MapView {
        self.session.render()
    }

    /// Number of fetches still in flight.
    pub fn pending(&self) -> usize {
        self.inflight.len()
    }

    /// Issue the session-opening fetches.
    pub fn start(&mut self) {
        for fetch in self.session.start() {
            self.spawn(fetch);
        }
    }

    /// Apply a user action and start the fetches it implies.
    pub fn dispatch(&mut self, action: Action) -> Result<usize, SelectionError> {
        let fetches = self.session.dispatch(action)?;
        let count = fetches.len();
        for fetch in fetches {
            self.spawn(fetch);
        }
        Ok(count)
    }

    fn spawn(&mut self, fetch: PendingFetch) {
        let backend = self.backend.clone();
        let timeout = self.timeout;
        let task = async move {
            let PendingFetch { scope, query } = fetch;
            let result = match tokio::time::timeout(timeout, backend.execute(&query)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} timed out after {:?}", query.endpoint(), timeout);
                    Err(FetchError::Timeout {
                        endpoint: query.endpoint(),
                        after: timeout,
                    })
                }
            };
            Completion { scope, query, result }
        };
        self.inflight.push(task.boxed_local());
    }

    /// Wait for the next fetch to land and apply it. `None` when nothing is
    /// in flight.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        let completion = self.inflight.next().await?;
        Some(self.session.complete(completion))
    }

    /// Run every in-flight fetch to completion.
    pub async fn settle(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Slice;
    use crate::state::VisualizationMode;
    use crate::testing::{best, point, ScriptedBackend};
    use cmx_core::{PhysicalVariable, RegionBoundsTable};

    fn region_of(query: &Query) -> Option<String> {
        match query {
            Query::Points(s) | Query::BestModels(s) | Query::Equivalence(s) => s.region.clone(),
            _ => None,
        }
    }

    /// Backend where every region-scoped response carries that region's
    /// name and arrives after `delay(region)`.
    fn regional_backend(delay: fn(Option<&str>) -> u64) -> ScriptedBackend {
        ScriptedBackend::new(move |query| {
            let region = region_of(query);
            let tag = region.clone().unwrap_or_else(|| "ALL".to_string());
            let payload = match query {
                Query::Regions => Payload::Regions(vec!["A".into(), "B".into(), "C".into()]),
                Query::Metrics { .. } => Payload::Metrics(vec!["RMSE".into()]),
                Query::RegionsForMetric { .. } => {
                    Payload::RegionsForMetric(vec!["A".into(), "B".into(), "C".into()])
                }
                Query::Points(_) => Payload::Points(vec![point(region.as_deref(), &tag, 45.0, 5.0)]),
                Query::BestModels(_) => {
                    Payload::BestModels(vec![best(region.as_deref(), &tag, Some(&tag), None)])
                }
                Query::Equivalence(_) => Payload::Equivalence(Default::default()),
            };
            (Duration::from_millis(delay(region.as_deref())), Ok(payload))
        })
    }

    async fn ready_for_regions(backend: ScriptedBackend) -> Driver<ScriptedBackend> {
        let session = Session::new(RegionBoundsTable::builtin().unwrap());
        let mut driver = Driver::new(backend, session, Duration::from_secs(5));
        driver.start();
        driver.dispatch(Action::SetVariable(Some(PhysicalVariable::Ppt))).unwrap();
        driver.settle().await;
        driver.dispatch(Action::SetMetric(Some("RMSE".into()))).unwrap();
        driver.settle().await;
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_selection_wins() {
        let backend = regional_backend(|region| match region {
            Some("A") => 300,
            Some("B") => 200,
            Some("C") => 10,
            _ => 1,
        });
        let mut driver = ready_for_regions(backend).await;
        assert_eq!(driver.session().catalogue().map(<[String]>::len), Some(3));

        driver.dispatch(Action::SetRegion(Some("A".into()))).unwrap();
        driver.dispatch(Action::SetRegion(Some("B".into()))).unwrap();
        driver.dispatch(Action::SetRegion(Some("C".into()))).unwrap();
        assert_eq!(driver.pending(), 9);

        let mut discarded = 0;
        while let Some(outcome) = driver.next_outcome().await {
            if matches!(outcome, Outcome::Discarded { .. }) {
                discarded += 1;
            }
            for mode in [VisualizationMode::Interaction, VisualizationMode::BestGcm] {
                let mut snapshot = driver.session().clone();
                snapshot.dispatch(Action::SetMode(mode)).unwrap();
                for marker in snapshot.render().markers {
                    assert_eq!(marker.region.as_deref(), Some("C"), "stale marker rendered");
                }
            }
        }
        assert_eq!(discarded, 6);

        let points = driver.session().derived().points.clone().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].gridpoint_id, "C");
        let best = driver.session().derived().best_models.clone().unwrap();
        assert_eq!(best.records[0].best_gcm.as_deref(), Some("C"));
        assert_eq!(driver.session().state().region(), Some("C"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_metric_list_never_lands() {
        let backend = ScriptedBackend::new(|query| match query {
            Query::Metrics { variable, .. } => {
                let (delay, metric) = match variable {
                    PhysicalVariable::Ppt => (500, "ppt-metric"),
                    PhysicalVariable::Tas => (5, "tas-metric"),
                };
                (Duration::from_millis(delay), Ok(Payload::Metrics(vec![metric.into()])))
            }
            _ => (Duration::from_millis(1), Ok(Payload::Regions(Vec::new()))),
        });
        let session = Session::new(RegionBoundsTable::builtin().unwrap());
        let mut driver = Driver::new(backend, session, Duration::from_secs(5));
        driver.dispatch(Action::SetVariable(Some(PhysicalVariable::Ppt))).unwrap();
        driver.dispatch(Action::SetVariable(Some(PhysicalVariable::Tas))).unwrap();
        let outcomes = driver.settle().await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], Outcome::Applied(Slice::Metrics));
        assert!(matches!(outcomes[1], Outcome::Discarded { slice: Slice::Metrics, .. }));
        assert_eq!(driver.session().state().available_metrics(), &["tas-metric".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out_and_clears_slice() {
        let backend = regional_backend(|region| match region {
            None => 1,
            Some(_) => 60_000,
        });
        let mut driver = ready_for_regions(backend).await;
        assert!(driver.session().derived().points.is_some());
        driver.dispatch(Action::SetRegion(Some("A".into()))).unwrap();
        let outcomes = driver.settle().await;
        assert_eq!(outcomes.len(), 3);
        for outcome in outcomes {
            match outcome {
                Outcome::Cleared { error, .. } => {
                    assert!(matches!(error, FetchError::Timeout { .. }))
                }
                other => panic!("expected timeout, got {:?}", other),
            }
        }
        assert!(driver.session().derived().is_empty());
        assert_eq!(driver.session().state().metric(), Some("RMSE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_slices_apply_in_any_order() {
        let backend = ScriptedBackend::new(|query| {
            let delay = match query {
                Query::Equivalence(_) => 5,
                Query::BestModels(_) => 20,
                Query::Points(_) => 40,
                _ => 1,
            };
            let payload = match query {
                Query::Metrics { .. } => Payload::Metrics(vec!["RMSE".into()]),
                Query::RegionsForMetric { .. } => Payload::RegionsForMetric(vec!["BI".into()]),
                Query::Points(_) => Payload::Points(vec![point(None, "1", 1.0, 1.0)]),
                Query::BestModels(_) => Payload::BestModels(vec![best(None, "1", Some("A"), Some("X"))]),
                Query::Equivalence(_) => Payload::Equivalence(Default::default()),
                Query::Regions => Payload::Regions(Vec::new()),
            };
            (Duration::from_millis(delay), Ok(payload))
        });
        let session = Session::new(RegionBoundsTable::builtin().unwrap());
        let mut driver = Driver::new(backend, session, Duration::from_secs(5));
        driver.dispatch(Action::SetVariable(Some(PhysicalVariable::Ppt))).unwrap();
        driver.settle().await;
        driver.dispatch(Action::SetMetric(Some("RMSE".into()))).unwrap();
        let order: Vec<Outcome> = driver.settle().await;
        assert_eq!(
            order,
            vec![
                Outcome::Applied(Slice::Regions),
                Outcome::Applied(Slice::Equivalence),
                Outcome::Applied(Slice::BestModels),
                Outcome::Applied(Slice::Points),
            ]
        );
    }
}
