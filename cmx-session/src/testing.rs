//! Builders and a scripted backend shared by the unit tests.

use crate::driver::Backend;
use cmx_core::{BestModelRecord, FetchError, GridPoint, Payload, Query};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

pub fn point(region: Option<&str>, id: &str, latitude: f64, longitude: f64) -> GridPoint {
    GridPoint {
        region: region.map(str::to_string),
        gridpoint_id: id.to_string(),
        latitude,
        longitude,
        gcm_effect: false,
        rcm_effect: false,
        interaction_effect: false,
    }
}

pub fn best(region: Option<&str>, id: &str, gcm: Option<&str>, rcm: Option<&str>) -> BestModelRecord {
    BestModelRecord {
        region: region.map(str::to_string),
        gridpoint_id: id.to_string(),
        latitude: 45.0,
        longitude: 5.0,
        best_gcm: gcm.map(str::to_string),
        best_rcm: rcm.map(str::to_string),
    }
}

type Script = dyn Fn(&Query) -> (Duration, Result<Payload, FetchError>);

/// Answers each query after the delay the script picks for it.
#[derive(Clone)]
pub struct ScriptedBackend {
    script: Rc<Script>,
}

impl ScriptedBackend {
    pub fn new(script: impl Fn(&Query) -> (Duration, Result<Payload, FetchError>) + 'static) -> Self {
        Self {
            script: Rc::new(script),
        }
    }
}

impl Backend for ScriptedBackend {
    fn execute(&self, query: &Query) -> impl Future<Output = Result<Payload, FetchError>> {
        let (delay, result) = (self.script)(query);
        async move {
            tokio::time::sleep(delay).await;
            result
        }
    }
}
