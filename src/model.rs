//! Linear scoring models
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Instance;
use crate::error::{Error, Result};
use crate::feature::{FeatureCatalog, FeatureId};

/// Weighted sum of feature values.
///
/// Features without a weight contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: BTreeMap<FeatureId, f64>,
}

/// Tagged structured representation, e.g. `{"Linear": {"weights": {"0": 0.5}}}`.
#[derive(Serialize, Deserialize)]
enum ModelRepr {
    Linear(LinearModel),
}

impl LinearModel {
    /// Creates a model from a weight per feature id.
    pub fn new(weights: BTreeMap<FeatureId, f64>) -> Self {
        LinearModel { weights }
    }

    /// Weights by feature id.
    pub fn weights(&self) -> &BTreeMap<FeatureId, f64> {
        &self.weights
    }

    /// Weight of `fid` (`0` when absent).
    pub fn weight(&self, fid: FeatureId) -> f64 {
        self.weights.get(&fid).copied().unwrap_or(0.0)
    }

    /// Scores an instance.
    pub fn score(&self, instance: &Instance) -> f64 {
        instance.dot(&self.weights)
    }

    /// Weights keyed by feature name.
    pub fn named_weights(&self, catalog: &FeatureCatalog) -> BTreeMap<String, f64> {
        self.weights
            .iter()
            .map(|(&fid, &w)| {
                let name = catalog
                    .name(fid)
                    .map(str::to_string)
                    .unwrap_or_else(|| fid.to_string());
                (name, w)
            })
            .collect()
    }

    /// Builds a model from weights keyed by feature name (or decimal id).
    pub fn from_named_weights(
        named: &BTreeMap<String, f64>,
        catalog: &FeatureCatalog,
    ) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (name, &w) in named.iter() {
            weights.insert(catalog.lookup(name)?, w);
        }
        Ok(LinearModel { weights })
    }

    /// Converts to the structured representation.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "Linear": { "weights": self.weights } })
    }

    /// Reads the structured representation.
    ///
    /// Weights are taken exactly as given; nothing is renormalized.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match serde_json::from_value::<ModelRepr>(value) {
            Ok(ModelRepr::Linear(model)) => Ok(model),
            Err(e) => Err(Error::MalformedModel(e.to_string())),
        }
    }

    /// Serializes the structured representation as JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// Parses JSON text produced by [`LinearModel::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::MalformedModel(e.to_string()))?;
        Self::from_value(value)
    }
}
