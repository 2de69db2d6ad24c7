//! Cascading selection state.
//!
//! `SelectionState` is a plain record. Every user action goes through
//! [`SelectionState::apply`], which returns the next state and leaves `self`
//! untouched. Changing a link of the variable → metric → region chain resets
//! everything below it and bumps `generation`, which invalidates every fetch
//! issued for an older generation.

use cmx_core::{ModelAxis, PhysicalVariable};
use cmx_utils::metric;
use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Which derived view the map shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    #[default]
    Interaction,
    BestGcm,
    BestRcm,
    GcmFilter,
    RcmFilter,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 5] = [
        VisualizationMode::Interaction,
        VisualizationMode::BestGcm,
        VisualizationMode::BestRcm,
        VisualizationMode::GcmFilter,
        VisualizationMode::RcmFilter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationMode::Interaction => "interaction",
            VisualizationMode::BestGcm => "best_gcm",
            VisualizationMode::BestRcm => "best_rcm",
            VisualizationMode::GcmFilter => "gcm_filter",
            VisualizationMode::RcmFilter => "rcm_filter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisualizationMode::Interaction => "Interaction Effects",
            VisualizationMode::BestGcm => "Best GCM",
            VisualizationMode::BestRcm => "Best RCM",
            VisualizationMode::GcmFilter => "Filter by GCM",
            VisualizationMode::RcmFilter => "Filter by RCM",
        }
    }

    /// Model axis the mode is about, if any.
    pub fn axis(&self) -> Option<ModelAxis> {
        match self {
            VisualizationMode::Interaction => None,
            VisualizationMode::BestGcm | VisualizationMode::GcmFilter => Some(ModelAxis::Gcm),
            VisualizationMode::BestRcm | VisualizationMode::RcmFilter => Some(ModelAxis::Rcm),
        }
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, VisualizationMode::GcmFilter | VisualizationMode::RcmFilter)
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase().replace('-', "_");
        VisualizationMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown visualization mode '{}' (expected one of interaction, best_gcm, best_rcm, gcm_filter, rcm_filter)",
                    s
                )
            })
    }
}

/// A user action on the selectors.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetVariable(Option<PhysicalVariable>),
    SetMetric(Option<String>),
    SetRegion(Option<String>),
    SetMode(VisualizationMode),
    SetGcmFilter(Option<String>),
    SetRcmFilter(Option<String>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// A selector was used before the one it depends on
    #[error("cannot set {field} before a {requires} is selected")]
    MissingUpstream {
        field: &'static str,
        requires: &'static str,
    },

    /// The value is not among the options currently offered
    #[error("{field} '{value}' is not available (choose one of: {offered})")]
    NotOffered {
        field: &'static str,
        value: String,
        offered: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionState {
    region: Option<String>,
    variable: Option<PhysicalVariable>,
    available_metrics: Vec<String>,
    metric: Option<String>,
    available_regions: Vec<String>,
    visualization_mode: VisualizationMode,
    gcm_filter_value: Option<String>,
    rcm_filter_value: Option<String>,
    generation: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn variable(&self) -> Option<PhysicalVariable> {
        self.variable
    }

    pub fn available_metrics(&self) -> &[String] {
        &self.available_metrics
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn available_regions(&self) -> &[String] {
        &self.available_regions
    }

    pub fn visualization_mode(&self) -> VisualizationMode {
        self.visualization_mode
    }

    pub fn gcm_filter_value(&self) -> Option<&str> {
        self.gcm_filter_value.as_deref()
    }

    pub fn rcm_filter_value(&self) -> Option<&str> {
        self.rcm_filter_value.as_deref()
    }

    pub fn filter_value(&self, axis: ModelAxis) -> Option<&str> {
        match axis {
            ModelAxis::Gcm => self.gcm_filter_value(),
            ModelAxis::Rcm => self.rcm_filter_value(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The next state after `action`. `self` is unchanged; an action that
    /// selects the current value returns an identical state.
    pub fn apply(&self, action: Action) -> Result<SelectionState, SelectionError> {
        match action {
            Action::SetVariable(variable) => Ok(self.with_variable(variable)),
            Action::SetMetric(metric) => self.with_metric(metric),
            Action::SetRegion(region) => self.with_region(region),
            Action::SetMode(mode) => Ok(self.with_mode(mode)),
            Action::SetGcmFilter(value) => Ok(self.with_filter(ModelAxis::Gcm, value)),
            Action::SetRcmFilter(value) => Ok(self.with_filter(ModelAxis::Rcm, value)),
        }
    }

    fn with_variable(&self, variable: Option<PhysicalVariable>) -> SelectionState {
        if variable == self.variable {
            return self.clone();
        }
        SelectionState {
            variable,
            metric: None,
            available_metrics: Vec::new(),
            region: None,
            available_regions: Vec::new(),
            generation: self.generation + 1,
            ..self.clone()
        }
    }

    fn with_metric(&self, metric: Option<String>) -> Result<SelectionState, SelectionError> {
        let metric = match metric.filter(|m| !m.trim().is_empty()) {
            None => None,
            Some(m) => {
                if self.variable.is_none() {
                    return Err(SelectionError::MissingUpstream {
                        field: "metric",
                        requires: "variable",
                    });
                }
                Some(self.resolve_metric(&m)?)
            }
        };
        if metric == self.metric {
            return Ok(self.clone());
        }
        Ok(SelectionState {
            metric,
            region: None,
            available_regions: Vec::new(),
            generation: self.generation + 1,
            ..self.clone()
        })
    }

    fn with_region(&self, region: Option<String>) -> Result<SelectionState, SelectionError> {
        let region = match region.filter(|r| !r.trim().is_empty()) {
            None => None,
            Some(r) => {
                if self.metric.is_none() {
                    return Err(SelectionError::MissingUpstream {
                        field: "region",
                        requires: "metric",
                    });
                }
                let r = r.trim();
                match self.available_regions.iter().find(|offered| offered.as_str() == r) {
                    Some(offered) => Some(offered.clone()),
                    None => {
                        return Err(SelectionError::NotOffered {
                            field: "region",
                            value: r.to_string(),
                            offered: self.available_regions.join(", "),
                        })
                    }
                }
            }
        };
        if region == self.region {
            return Ok(self.clone());
        }
        Ok(SelectionState {
            region,
            generation: self.generation + 1,
            ..self.clone()
        })
    }

    fn with_mode(&self, mode: VisualizationMode) -> SelectionState {
        let mut next = SelectionState {
            visualization_mode: mode,
            ..self.clone()
        };
        if mode != self.visualization_mode {
            // Entering a filter mode starts without a chosen model
            match mode {
                VisualizationMode::GcmFilter => next.gcm_filter_value = None,
                VisualizationMode::RcmFilter => next.rcm_filter_value = None,
                _ => {}
            }
        }
        next
    }

    fn with_filter(&self, axis: ModelAxis, value: Option<String>) -> SelectionState {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let mut next = self.clone();
        match axis {
            ModelAxis::Gcm => next.gcm_filter_value = value,
            ModelAxis::Rcm => next.rcm_filter_value = value,
        }
        next
    }

    /// Match user input against the offered metrics, accepting either the
    /// metric as listed or its percent-encoded form.
    fn resolve_metric(&self, input: &str) -> Result<String, SelectionError> {
        let decoded = metric::decode_lossy(input.trim());
        self.available_metrics
            .iter()
            .find(|m| m.as_str() == input || m.as_str() == input.trim() || **m == decoded)
            .cloned()
            .ok_or_else(|| SelectionError::NotOffered {
                field: "metric",
                value: input.to_string(),
                offered: self.available_metrics.join(", "),
            })
    }

    /// Option list from a `list_metrics` response for the live generation.
    pub(crate) fn offer_metrics(&mut self, metrics: Vec<String>) {
        self.available_metrics = metrics;
    }

    /// Option list from a `list_regions_for_metric` response for the live
    /// generation.
    pub(crate) fn offer_regions(&mut self, regions: Vec<String>) {
        self.available_regions = regions;
    }
}
