//! reqwest client for the comparison-results backend.

use crate::error::FetchError;
use crate::query::{Payload, Query};
use crate::variable::PhysicalVariable;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

/// Where the backend lives and how long a request may take.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub const DEFAULT_URL: &'static str = "http://127.0.0.1:5000";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL, Self::DEFAULT_TIMEOUT)
    }
}

/// Cheaply cloneable handle to the backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                endpoint: "client",
                message: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Issue a single GET and decode the body. No retries.
    pub async fn execute(&self, query: &Query) -> Result<Payload, FetchError> {
        let endpoint = query.endpoint();
        let url = query.url(&self.config.base_url);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    endpoint,
                    after: self.config.timeout,
                }
            } else {
                FetchError::Transport {
                    endpoint,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Bad response status for {}: {}", url, status);
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transport {
            endpoint,
            message: e.to_string(),
        })?;
        query.decode(&body)
    }

    pub async fn list_regions(&self) -> Result<Vec<String>, FetchError> {
        match self.execute(&Query::Regions).await? {
            Payload::Regions(regions) => Ok(regions),
            other => Err(unexpected("list_regions", &other)),
        }
    }

    pub async fn list_metrics(
        &self,
        variable: PhysicalVariable,
        region: Option<&str>,
    ) -> Result<Vec<String>, FetchError> {
        let query = Query::Metrics {
            variable,
            region: region.map(str::to_string),
        };
        match self.execute(&query).await? {
            Payload::Metrics(metrics) => Ok(metrics),
            other => Err(unexpected("list_metrics", &other)),
        }
    }
}

fn unexpected(endpoint: &'static str, payload: &Payload) -> FetchError {
    FetchError::Decode {
        endpoint,
        message: format!("unexpected {} payload", payload.kind()),
    }
}
