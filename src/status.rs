use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Possible outcomes of a training run
pub enum StatusCode {
    /// Optimization not started
    Initialized,
    /// A full pass accepted no update
    Converged,
    /// Maximum number of passes reached
    MaxIterations,
    /// Stopped by the observer
    Callback,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// A struct containing information about the current point and state of one restart
pub struct Status {
    /// Current weight per feature
    pub weights: BTreeMap<FeatureId, f64>,
    /// Mean metric value of the current weights
    pub value: f64,
    /// Index of the restart
    pub restart: usize,
    /// Number of completed passes over all coordinates
    pub iteration: usize,
    /// Number of coordinate updates accepted in the last pass
    pub accepted: usize,
    /// Current status
    pub code: StatusCode,
    /// Elapsed time (in seconds)
    pub time: f64,
}

impl Status {
    /// Create a [`Status`] for restart `restart` starting from `weights`
    pub fn new(restart: usize, weights: BTreeMap<FeatureId, f64>) -> Status {
        Status {
            weights,
            value: f64::NEG_INFINITY,
            restart,
            iteration: 0,
            accepted: 0,
            code: StatusCode::Initialized,
            time: 0.0,
        }
    }

    /// Whether `self` should replace `other` as the best restart.
    ///
    /// Higher values win; equal values go to the lower restart index.
    pub fn beats(&self, other: &Status) -> bool {
        self.value > other.value || (self.value == other.value && self.restart < other.restart)
    }
}
