//! Backend endpoints, their query strings and decoded payloads.

use crate::error::FetchError;
use crate::grid_point::{BestModelRecord, GridPoint};
use crate::variable::PhysicalVariable;
use cmx_utils::metric;
use serde::Deserialize;
use std::collections::HashMap;

/// Variable, metric and optional region a result set is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataScope {
    pub variable: PhysicalVariable,
    pub metric: String,
    pub region: Option<String>,
}

/// One read-only backend request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Every region the backend has results for
    Regions,
    /// Metrics available for a variable, optionally within one region
    Metrics {
        variable: PhysicalVariable,
        region: Option<String>,
    },
    /// Regions that have results for a variable and metric
    RegionsForMetric {
        variable: PhysicalVariable,
        metric: String,
    },
    /// Per-gridpoint effect flags
    Points(DataScope),
    /// Per-gridpoint best GCM and RCM
    BestModels(DataScope),
    /// Per-gridpoint equivalent best models
    Equivalence(DataScope),
}

/// Raw `equivalent_best_models` body, keyed by the backend's key spelling.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EquivalencePayload {
    #[serde(default)]
    pub equivalent_best_gcms: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub equivalent_best_rcms: HashMap<String, Vec<String>>,
}

/// A decoded backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Regions(Vec<String>),
    Metrics(Vec<String>),
    RegionsForMetric(Vec<String>),
    Points(Vec<GridPoint>),
    BestModels(Vec<BestModelRecord>),
    Equivalence(EquivalencePayload),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Regions(_) => "regions",
            Payload::Metrics(_) => "metrics",
            Payload::RegionsForMetric(_) => "regions-for-metric",
            Payload::Points(_) => "points",
            Payload::BestModels(_) => "best-models",
            Payload::Equivalence(_) => "equivalence",
        }
    }
}

#[derive(Deserialize)]
struct RegionsBody {
    #[serde(default)]
    regions: Vec<String>,
}

#[derive(Deserialize)]
struct MetricsBody {
    #[serde(default)]
    metrics: Vec<String>,
}

impl Query {
    /// Backend route name.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Query::Regions => "list_regions",
            Query::Metrics { .. } => "list_metrics",
            Query::RegionsForMetric { .. } => "list_regions_for_metric",
            Query::Points(_) => "load_csv",
            Query::BestModels(_) => "best_models",
            Query::Equivalence(_) => "equivalent_best_models",
        }
    }

    /// Percent-encoded query string, without the leading `?`.
    pub fn query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        match self {
            Query::Regions => {}
            Query::Metrics { variable, region } => {
                params.push(("physical_variable", variable.as_str().to_string()));
                if let Some(region) = region {
                    params.push(("region", urlencoding::encode(region).into_owned()));
                }
            }
            Query::RegionsForMetric { variable, metric } => {
                params.push(("physical_variable", variable.as_str().to_string()));
                params.push(("metric", metric::encode(metric).into_owned()));
            }
            Query::Points(scope) | Query::BestModels(scope) | Query::Equivalence(scope) => {
                params.push(("physical_variable", scope.variable.as_str().to_string()));
                params.push(("metric", metric::encode(&scope.metric).into_owned()));
                if let Some(region) = &scope.region {
                    params.push(("region", urlencoding::encode(region).into_owned()));
                }
            }
        }
        params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<String>>()
            .join("&")
    }

    /// Full request URL under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let query = self.query_string();
        if query.is_empty() {
            format!("{}/{}", base, self.endpoint())
        } else {
            format!("{}/{}?{}", base, self.endpoint(), query)
        }
    }

    /// Decode a response body into the payload this query expects.
    pub fn decode(&self, body: &str) -> Result<Payload, FetchError> {
        let endpoint = self.endpoint();
        let err = |e: serde_json::Error| FetchError::Decode {
            endpoint,
            message: e.to_string(),
        };
        let payload = match self {
            Query::Regions => Payload::Regions(serde_json::from_str::<RegionsBody>(body).map_err(err)?.regions),
            Query::Metrics { .. } => {
                Payload::Metrics(serde_json::from_str::<MetricsBody>(body).map_err(err)?.metrics)
            }
            Query::RegionsForMetric { .. } => Payload::RegionsForMetric(
                serde_json::from_str::<RegionsBody>(body).map_err(err)?.regions,
            ),
            Query::Points(_) => Payload::Points(serde_json::from_str(body).map_err(err)?),
            Query::BestModels(_) => Payload::BestModels(serde_json::from_str(body).map_err(err)?),
            Query::Equivalence(_) => Payload::Equivalence(serde_json::from_str(body).map_err(err)?),
        };
        Ok(payload)
    }
}
