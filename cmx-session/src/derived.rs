//! Data slices filled in by backend responses.
//!
//! Each slice is replaced wholesale when its response is applied, so a
//! reader only ever sees a complete snapshot. `None` means "not loaded":
//! either still in flight, cleared by a selection change, or cleared by a
//! failed fetch.

use cmx_core::{BestModelRecord, GridPoint, ModelAxis};
use cmx_data::{ColorMap, EquivalenceIndex};
use std::collections::BTreeSet;

/// A best-models result with the color maps derived from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BestModels {
    pub records: Vec<BestModelRecord>,
    pub gcm_colors: ColorMap,
    pub rcm_colors: ColorMap,
}

impl BestModels {
    pub fn new(records: Vec<BestModelRecord>) -> Self {
        let gcm_colors = ColorMap::from_records(&records, ModelAxis::Gcm);
        let rcm_colors = ColorMap::from_records(&records, ModelAxis::Rcm);
        Self {
            records,
            gcm_colors,
            rcm_colors,
        }
    }

    pub fn colors(&self, axis: ModelAxis) -> &ColorMap {
        match axis {
            ModelAxis::Gcm => &self.gcm_colors,
            ModelAxis::Rcm => &self.rcm_colors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedData {
    pub points: Option<Vec<GridPoint>>,
    pub best_models: Option<BestModels>,
    pub equivalence: Option<EquivalenceIndex>,
}

impl DerivedData {
    pub fn clear(&mut self) {
        self.points = None;
        self.best_models = None;
        self.equivalence = None;
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_none() && self.best_models.is_none() && self.equivalence.is_none()
    }

    /// Model names a filter on `axis` can choose from: every best pick and
    /// every equivalent model, sorted.
    pub fn filter_options(&self, axis: ModelAxis) -> Vec<String> {
        let mut options: BTreeSet<&str> = BTreeSet::new();
        if let Some(best) = &self.best_models {
            options.extend(best.records.iter().filter_map(|r| r.best(axis)));
        }
        if let Some(index) = &self.equivalence {
            options.extend(index.models(axis));
        }
        options.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmx_core::EquivalencePayload;
    use std::collections::HashMap;

    fn record(id: &str, gcm: Option<&str>) -> BestModelRecord {
        BestModelRecord {
            region: None,
            gridpoint_id: id.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            best_gcm: gcm.map(str::to_string),
            best_rcm: None,
        }
    }

    #[test]
    fn test_best_models_builds_both_color_maps() {
        let best = BestModels::new(vec![record("1", Some("A")), record("2", Some("B")), record("3", Some("A"))]);
        assert_eq!(best.colors(ModelAxis::Gcm).len(), 2);
        assert!(best.colors(ModelAxis::Rcm).is_empty());
    }

    #[test]
    fn test_filter_options_include_equivalent_models() {
        let mut gcms = HashMap::new();
        gcms.insert("1".to_string(), vec!["C".to_string(), "A".to_string()]);
        let payload = EquivalencePayload {
            equivalent_best_gcms: gcms,
            equivalent_best_rcms: HashMap::new(),
        };
        let derived = DerivedData {
            points: None,
            best_models: Some(BestModels::new(vec![record("1", Some("B")), record("2", None)])),
            equivalence: Some(EquivalenceIndex::build(&payload)),
        };
        assert_eq!(derived.filter_options(ModelAxis::Gcm), vec!["A", "B", "C"]);
        assert!(derived.filter_options(ModelAxis::Rcm).is_empty());
    }

    #[test]
    fn test_clear_drops_every_slice() {
        let mut derived = DerivedData {
            points: Some(Vec::new()),
            best_models: Some(BestModels::default()),
            equivalence: Some(EquivalenceIndex::default()),
        };
        assert!(!derived.is_empty());
        derived.clear();
        assert!(derived.is_empty());
    }
}
