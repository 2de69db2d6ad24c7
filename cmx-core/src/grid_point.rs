use crate::key::CompositeKey;
use crate::wire;
use serde::Deserialize;

/// Per-gridpoint ANOVA effect flags from the `load_csv` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridPoint {
    #[serde(default, deserialize_with = "wire::optional_name")]
    pub region: Option<String>,
    #[serde(rename = "Gridpoint", alias = "gridpoint", deserialize_with = "wire::gridpoint_id")]
    pub gridpoint_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "GCM_effect", alias = "gcm_effect", default, deserialize_with = "wire::flag")]
    pub gcm_effect: bool,
    #[serde(rename = "RCM_effect", alias = "rcm_effect", default, deserialize_with = "wire::flag")]
    pub rcm_effect: bool,
    #[serde(
        rename = "Interaction_effect",
        alias = "interaction_effect",
        default,
        deserialize_with = "wire::flag"
    )]
    pub interaction_effect: bool,
}

impl GridPoint {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.region.as_deref(), &self.gridpoint_id)
    }
}

/// Best GCM and RCM at a gridpoint from the `best_models` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BestModelRecord {
    #[serde(default, deserialize_with = "wire::optional_name")]
    pub region: Option<String>,
    #[serde(rename = "Gridpoint", alias = "gridpoint", deserialize_with = "wire::gridpoint_id")]
    pub gridpoint_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "Best_GCM", alias = "best_gcm", default, deserialize_with = "wire::optional_name")]
    pub best_gcm: Option<String>,
    #[serde(rename = "Best_RCM", alias = "best_rcm", default, deserialize_with = "wire::optional_name")]
    pub best_rcm: Option<String>,
}

impl BestModelRecord {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.region.as_deref(), &self.gridpoint_id)
    }

    pub fn best(&self, axis: crate::ModelAxis) -> Option<&str> {
        match axis {
            crate::ModelAxis::Gcm => self.best_gcm.as_deref(),
            crate::ModelAxis::Rcm => self.best_rcm.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelAxis;
    use serde_json::json;

    #[test]
    fn test_grid_point_from_pandas_record() {
        let record = json!({
            "Gridpoint": 1203,
            "latitude": 51.5,
            "longitude": -0.12,
            "GCM_effect": 1,
            "RCM_effect": 0,
            "Interaction_effect": false,
            "min_gcm": 0.3,
            "region": "BI"
        });
        let point: GridPoint = serde_json::from_value(record).unwrap();
        assert_eq!(point.gridpoint_id, "1203");
        assert_eq!(point.region.as_deref(), Some("BI"));
        assert!(point.gcm_effect);
        assert!(!point.rcm_effect);
        assert!(!point.interaction_effect);
        assert_eq!(point.key(), CompositeKey::new(Some("BI"), "1203"));
    }

    #[test]
    fn test_grid_point_lowercase_columns_and_text_flags() {
        let record = json!({
            "gridpoint": "g-7",
            "latitude": 40.0,
            "longitude": 3.0,
            "gcm_effect": "False",
            "rcm_effect": "True",
            "interaction_effect": null
        });
        let point: GridPoint = serde_json::from_value(record).unwrap();
        assert_eq!(point.gridpoint_id, "g-7");
        assert_eq!(point.region, None);
        assert!(!point.gcm_effect);
        assert!(point.rcm_effect);
        assert!(!point.interaction_effect);
    }

    #[test]
    fn test_float_gridpoint_drops_trailing_zero() {
        let record = json!({"Gridpoint": 12.0, "latitude": 0.0, "longitude": 0.0});
        let point: GridPoint = serde_json::from_value(record).unwrap();
        assert_eq!(point.gridpoint_id, "12");
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let record = json!({"Gridpoint": 1, "latitude": 0.0, "longitude": 0.0, "GCM_effect": "maybe"});
        assert!(serde_json::from_value::<GridPoint>(record).is_err());
    }

    #[test]
    fn test_best_model_blank_names_are_absent() {
        let record = json!({
            "Gridpoint": 5,
            "latitude": 45.0,
            "longitude": 7.0,
            "Best_GCM": "MPI-ESM-LR",
            "Best_RCM": "  ",
            "region": ""
        });
        let best: BestModelRecord = serde_json::from_value(record).unwrap();
        assert_eq!(best.best(ModelAxis::Gcm), Some("MPI-ESM-LR"));
        assert_eq!(best.best(ModelAxis::Rcm), None);
        assert_eq!(best.region, None);
        assert_eq!(best.key().to_string(), "5");
    }

    #[test]
    fn test_best_model_missing_columns_are_absent() {
        let record = json!({"gridpoint": 5, "latitude": 45.0, "longitude": 7.0, "best_rcm": null});
        let best: BestModelRecord = serde_json::from_value(record).unwrap();
        assert_eq!(best.best_gcm, None);
        assert_eq!(best.best_rcm, None);
    }
}
