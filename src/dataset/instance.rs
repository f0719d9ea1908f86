use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureId;

/// One judged document of a query: sparse features and a relevance grade.
///
/// Features missing from the map have value `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    qid: String,
    gain: f64,
    features: BTreeMap<FeatureId, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Instance {
    /// Creates an instance of query `qid` with relevance grade `gain`.
    pub fn new(qid: impl Into<String>, gain: f64, features: BTreeMap<FeatureId, f64>) -> Self {
        Instance {
            qid: qid.into(),
            gain,
            features,
            name: None,
        }
    }

    /// Attaches a document name, used to look up external judgments.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Query the instance belongs to.
    pub fn qid(&self) -> &str {
        &self.qid
    }

    /// Relevance grade stored with the instance.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Whether the stored grade marks the document relevant.
    pub fn is_relevant(&self) -> bool {
        self.gain > 0.0
    }

    /// Document name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Non-zero features in ascending id order.
    pub fn features(&self) -> &BTreeMap<FeatureId, f64> {
        &self.features
    }

    /// Value of feature `fid` (`0` when absent).
    pub fn get(&self, fid: FeatureId) -> f64 {
        self.features.get(&fid).copied().unwrap_or(0.0)
    }

    /// Weighted sum over the features present in both the instance and `weights`.
    pub fn dot(&self, weights: &BTreeMap<FeatureId, f64>) -> f64 {
        let mut sum = 0.0;
        for (fid, x) in self.features.iter() {
            if let Some(w) = weights.get(fid) {
                sum += x * w;
            }
        }
        sum
    }

    pub(crate) fn restricted(&self, keep: &[FeatureId]) -> Instance {
        Instance {
            qid: self.qid.clone(),
            gain: self.gain,
            features: self
                .features
                .iter()
                .filter(|(fid, _)| keep.binary_search(fid).is_ok())
                .map(|(&fid, &x)| (fid, x))
                .collect(),
            name: self.name.clone(),
        }
    }
}
