//! Statistically equivalent best models per gridpoint.

use cmx_core::{BestModelRecord, CompositeKey, EquivalencePayload, ModelAxis};
use log::debug;
use std::collections::{BTreeSet, HashMap};

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Backend key → equivalent model names, for GCMs and RCMs separately.
///
/// Keys are kept in the backend's spelling (`"{region}-{gridpoint}"` or the
/// bare gridpoint id) and lookups spell the composite key the same way, so
/// the index never depends on which regions were known when it was built.
/// The backend payload is taken as is. In particular a gridpoint's best
/// model is not required to appear in its own equivalence set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquivalenceIndex {
    gcms: HashMap<String, BTreeSet<String>>,
    rcms: HashMap<String, BTreeSet<String>>,
}

impl EquivalenceIndex {
    pub fn build(payload: &EquivalencePayload) -> Self {
        let convert = |raw: &HashMap<String, Vec<String>>| {
            raw.iter()
                .map(|(key, models)| {
                    let models: BTreeSet<String> = models
                        .iter()
                        .map(|m| m.trim())
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect();
                    (key.trim().to_string(), models)
                })
                .collect::<HashMap<String, BTreeSet<String>>>()
        };
        let index = Self {
            gcms: convert(&payload.equivalent_best_gcms),
            rcms: convert(&payload.equivalent_best_rcms),
        };
        debug!(
            "Built equivalence index: {} GCM keys, {} RCM keys",
            index.gcms.len(),
            index.rcms.len()
        );
        index
    }

    fn axis(&self, axis: ModelAxis) -> &HashMap<String, BTreeSet<String>> {
        match axis {
            ModelAxis::Gcm => &self.gcms,
            ModelAxis::Rcm => &self.rcms,
        }
    }

    /// Equivalent models at a gridpoint; empty when the backend has none.
    pub fn lookup(&self, region: Option<&str>, gridpoint: &str, axis: ModelAxis) -> &BTreeSet<String> {
        self.lookup_key(&CompositeKey::new(region, gridpoint), axis)
    }

    pub fn lookup_key(&self, key: &CompositeKey, axis: ModelAxis) -> &BTreeSet<String> {
        self.axis(axis).get(&key.to_string()).unwrap_or(&EMPTY)
    }

    /// Models that count as "best" at a record's gridpoint: its equivalence
    /// set, or only the single best model when there is no set.
    pub fn effective_models(&self, record: &BestModelRecord, axis: ModelAxis) -> BTreeSet<String> {
        let set = self.lookup_key(&record.key(), axis);
        if !set.is_empty() {
            return set.clone();
        }
        record.best(axis).map(str::to_string).into_iter().collect()
    }

    /// Every model named anywhere on `axis`, sorted.
    pub fn models(&self, axis: ModelAxis) -> BTreeSet<&str> {
        self.axis(axis)
            .values()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self, axis: ModelAxis) -> usize {
        self.axis(axis).len()
    }

    pub fn is_empty(&self) -> bool {
        self.gcms.is_empty() && self.rcms.is_empty()
    }
}
