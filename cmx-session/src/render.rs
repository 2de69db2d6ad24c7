//! Renderer-agnostic map view.
//!
//! [`render`] turns the live selection and its derived data into markers,
//! a legend, a viewport target and an optional region overlay. Any map
//! library can draw the result; nothing here knows about tiles.

use crate::derived::{BestModels, DerivedData};
use crate::state::{SelectionState, VisualizationMode};
use cmx_core::{BestModelRecord, BoundingBox, CompositeKey, ModelAxis, PhysicalVariable, RegionBounds, RegionBoundsTable};
use cmx_data::classify::{classify, Category};
use cmx_data::viewport::compute_bounds;
use cmx_data::{Color, EquivalenceIndex};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip)]
    pub key: CompositeKey,
    pub region: Option<String>,
    pub gridpoint: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: Color,
    pub tooltip: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Selection generation this view was rendered for
    pub generation: u64,
    pub mode: VisualizationMode,
    pub variable: Option<PhysicalVariable>,
    pub metric: Option<String>,
    pub region: Option<String>,
    pub markers: Vec<Marker>,
    pub legend: Vec<LegendEntry>,
    /// Bounds to fit; `None` keeps the current viewport
    pub viewport: Option<BoundingBox>,
    /// Boundary of the selected region, when it is a known region
    pub overlay: Option<RegionBounds>,
}

pub fn render(state: &SelectionState, derived: &DerivedData, bounds: &RegionBoundsTable) -> MapView {
    let mode = state.visualization_mode();
    let empty = EquivalenceIndex::default();
    let equivalence = derived.equivalence.as_ref().unwrap_or(&empty);

    let (markers, legend) = match mode {
        VisualizationMode::Interaction => (interaction_markers(derived), interaction_legend()),
        VisualizationMode::BestGcm | VisualizationMode::BestRcm => {
            let axis = mode.axis().unwrap_or(ModelAxis::Gcm);
            match &derived.best_models {
                Some(best) => (
                    best_markers(best, equivalence, axis),
                    best_legend(best, axis),
                ),
                None => (Vec::new(), Vec::new()),
            }
        }
        VisualizationMode::GcmFilter | VisualizationMode::RcmFilter => {
            let axis = mode.axis().unwrap_or(ModelAxis::Gcm);
            let selected = state.filter_value(axis);
            match &derived.best_models {
                Some(best) => (
                    filter_markers(best, equivalence, axis, selected),
                    filter_legend(best, axis, selected),
                ),
                None => (Vec::new(), Vec::new()),
            }
        }
    };

    let viewport = compute_bounds(
        markers.iter().map(|m| (m.latitude, m.longitude)),
        state.region(),
        bounds,
    );
    let overlay = state.region().and_then(|r| bounds.entry(r)).cloned();

    MapView {
        generation: state.generation(),
        mode,
        variable: state.variable(),
        metric: state.metric().map(str::to_string),
        region: state.region().map(str::to_string),
        markers,
        legend,
        viewport,
        overlay,
    }
}

fn interaction_markers(derived: &DerivedData) -> Vec<Marker> {
    let Some(points) = &derived.points else {
        return Vec::new();
    };
    points
        .iter()
        .map(|p| {
            let mut tooltip = vec![format!("Gridpoint: {}", p.gridpoint_id)];
            if let Some(region) = &p.region {
                tooltip.push(format!("Region: {}", region));
            }
            tooltip.push(format!("GCM Effect: {}", p.gcm_effect));
            tooltip.push(format!("RCM Effect: {}", p.rcm_effect));
            tooltip.push(format!("Interaction Effect: {}", p.interaction_effect));
            Marker {
                key: p.key(),
                region: p.region.clone(),
                gridpoint: p.gridpoint_id.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
                color: classify(p).color(),
                tooltip,
            }
        })
        .collect()
}

fn interaction_legend() -> Vec<LegendEntry> {
    Category::ALL
        .iter()
        .map(|c| LegendEntry {
            label: c.label().to_string(),
            color: c.color(),
        })
        .collect()
}

fn model_tooltip(record: &BestModelRecord, equivalence: &EquivalenceIndex, axis: ModelAxis) -> Vec<String> {
    let mut tooltip = vec![format!("Gridpoint: {}", record.gridpoint_id)];
    if let Some(region) = &record.region {
        tooltip.push(format!("Region: {}", region));
    }
    tooltip.push(format!(
        "Best {}: {}",
        axis.label(),
        record.best(axis).unwrap_or("-")
    ));
    let equivalent = equivalence.lookup_key(&record.key(), axis);
    let equivalent = if equivalent.is_empty() {
        "-".to_string()
    } else {
        equivalent.iter().map(String::as_str).collect::<Vec<&str>>().join(", ")
    };
    tooltip.push(format!("Equivalent {}s: {}", axis.label(), equivalent));
    tooltip
}

fn record_marker(record: &BestModelRecord, color: Color, tooltip: Vec<String>) -> Marker {
    Marker {
        key: record.key(),
        region: record.region.clone(),
        gridpoint: record.gridpoint_id.clone(),
        latitude: record.latitude,
        longitude: record.longitude,
        color,
        tooltip,
    }
}

fn best_markers(best: &BestModels, equivalence: &EquivalenceIndex, axis: ModelAxis) -> Vec<Marker> {
    let colors = best.colors(axis);
    best.records
        .iter()
        .map(|r| {
            record_marker(
                r,
                colors.color_or_gray(r.best(axis)),
                model_tooltip(r, equivalence, axis),
            )
        })
        .collect()
}

fn best_legend(best: &BestModels, axis: ModelAxis) -> Vec<LegendEntry> {
    best.colors(axis)
        .iter()
        .map(|(model, hsl)| LegendEntry {
            label: model.to_string(),
            color: hsl.into(),
        })
        .collect()
}

fn filter_color(best: &BestModels, axis: ModelAxis, model: &str) -> Color {
    best.colors(axis)
        .get(model)
        .map(Color::Hsl)
        .unwrap_or(Color::HIGHLIGHT)
}

fn filter_markers(
    best: &BestModels,
    equivalence: &EquivalenceIndex,
    axis: ModelAxis,
    selected: Option<&str>,
) -> Vec<Marker> {
    best.records
        .iter()
        .map(|r| {
            let matches = selected
                .map(|model| equivalence.effective_models(r, axis).contains(model))
                .unwrap_or(false);
            let color = match (matches, selected) {
                (true, Some(model)) => filter_color(best, axis, model),
                _ => Color::LIGHT_GRAY,
            };
            record_marker(r, color, model_tooltip(r, equivalence, axis))
        })
        .collect()
}

fn filter_legend(best: &BestModels, axis: ModelAxis, selected: Option<&str>) -> Vec<LegendEntry> {
    let mut legend = Vec::new();
    if let Some(model) = selected {
        legend.push(LegendEntry {
            label: model.to_string(),
            color: filter_color(best, axis, model),
        });
    }
    legend.push(LegendEntry {
        label: "Other".to_string(),
        color: Color::LIGHT_GRAY,
    });
    legend
}
