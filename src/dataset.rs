//! Query-grouped sparse training data
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::feature::{FeatureCatalog, FeatureId};
use crate::model::LinearModel;

mod dense;
mod instance;
mod sampling;

pub use dense::AsF64;
pub use instance::Instance;

/// An immutable sequence of [`Instance`]s grouped by query.
///
/// Every feature id used by an instance is registered in the [`FeatureCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetRepr", into = "DatasetRepr")]
pub struct Dataset {
    instances: Vec<Instance>,
    catalog: FeatureCatalog,
    by_query: BTreeMap<String, Vec<usize>>,
}

#[derive(Serialize, Deserialize)]
struct DatasetRepr {
    features: FeatureCatalog,
    instances: Vec<Instance>,
}

impl Dataset {
    /// Builds a dataset from loader output.
    ///
    /// Every feature id referenced by an instance is registered, named by
    /// `names` when it has an entry and by its decimal id otherwise.
    /// Entries of `names` are registered even if no instance uses them.
    pub fn from_instances(
        instances: Vec<Instance>,
        names: Option<&HashMap<FeatureId, String>>,
    ) -> Result<Dataset> {
        let mut catalog = FeatureCatalog::new();
        if let Some(names) = names {
            let mut sorted: Vec<_> = names.iter().collect();
            sorted.sort();
            for (&fid, name) in sorted {
                catalog.insert(fid, Some(name))?;
            }
        }
        for inst in instances.iter() {
            for &fid in inst.features().keys() {
                catalog.ensure(fid)?;
            }
        }
        Dataset::with_catalog(instances, catalog)
    }

    /// Builds a dataset whose features must all be registered in `catalog`.
    ///
    /// Grades must be finite and non-negative, feature values finite.
    pub fn with_catalog(instances: Vec<Instance>, catalog: FeatureCatalog) -> Result<Dataset> {
        let mut by_query: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, inst) in instances.iter().enumerate() {
            if !inst.gain().is_finite() || inst.gain() < 0.0 {
                return Err(Error::InvalidGrade {
                    qid: inst.qid().to_string(),
                    grade: inst.gain(),
                });
            }
            for (&fid, &x) in inst.features().iter() {
                if !catalog.contains(fid) {
                    return Err(Error::UnknownFeature(fid.to_string()));
                }
                if !x.is_finite() {
                    return Err(Error::InvalidFeatureValue {
                        qid: inst.qid().to_string(),
                        feature: fid.as_u32(),
                        value: x,
                    });
                }
            }
            by_query.entry(inst.qid().to_string()).or_default().push(idx);
        }
        Ok(Dataset {
            instances,
            catalog,
            by_query,
        })
    }

    /// Parses the structured (JSON) representation.
    pub fn from_json(json: &str) -> Result<Dataset> {
        Ok(serde_json::from_str(json)?)
    }

    /// Produces the structured (JSON) representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Distinct query ids in ascending order.
    pub fn queries(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_query.keys().map(String::as_str)
    }

    /// Number of distinct queries.
    pub fn num_queries(&self) -> usize {
        self.by_query.len()
    }

    /// Instance indices of a query, in insertion order.
    pub fn instances_for(&self, qid: &str) -> Option<&[usize]> {
        self.by_query.get(qid).map(Vec::as_slice)
    }

    pub(crate) fn query_groups(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.by_query
    }

    /// All instances in insertion order.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Instance at position `idx`.
    pub fn instance(&self, idx: usize) -> Option<&Instance> {
        self.instances.get(idx)
    }

    /// Number of instances.
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// The feature catalog.
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// Registered feature ids in ascending order.
    pub fn feature_ids(&self) -> Vec<FeatureId> {
        self.catalog.ids().collect()
    }

    /// Registered feature names in ascending id order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.catalog.names().collect()
    }

    /// Number of registered features.
    pub fn num_features(&self) -> usize {
        self.catalog.len()
    }

    /// The catalog's name to id mapping.
    pub fn feature_name_to_index(&self) -> &HashMap<String, FeatureId> {
        self.catalog.name_to_index()
    }

    /// Name of a feature, or its decimal id when unregistered.
    pub fn feature_name(&self, fid: FeatureId) -> String {
        self.catalog
            .name(fid)
            .map(str::to_string)
            .unwrap_or_else(|| fid.to_string())
    }

    /// Resolves a feature by name or decimal id.
    pub fn lookup_feature(&self, name_or_number: &str) -> Result<FeatureId> {
        self.catalog.lookup(name_or_number)
    }

    /// Model score of every instance, in insertion order.
    pub fn predict_scores(&self, model: &LinearModel) -> Vec<f64> {
        self.instances.iter().map(|inst| model.score(inst)).collect()
    }

    pub(crate) fn score_all(&self, weights: &BTreeMap<FeatureId, f64>) -> Vec<f64> {
        self.instances.iter().map(|inst| inst.dot(weights)).collect()
    }
}

impl TryFrom<DatasetRepr> for Dataset {
    type Error = Error;

    fn try_from(repr: DatasetRepr) -> Result<Self> {
        Dataset::with_catalog(repr.instances, repr.features)
    }
}

impl From<Dataset> for DatasetRepr {
    fn from(dataset: Dataset) -> Self {
        DatasetRepr {
            features: dataset.catalog,
            instances: dataset.instances,
        }
    }
}
