//! Train linear ranking models by coordinate ascent and evaluate them with IR metrics.
#![warn(missing_docs)]

pub mod ca;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod feature;
pub mod metric;
pub mod model;
pub mod qrel;
mod run;
pub mod train;

mod status;
pub use crate::dataset::{AsF64, Dataset, Instance};
pub use crate::error::{Error, Result};
pub use crate::evaluate::Evaluator;
pub use crate::feature::{FeatureCatalog, FeatureId};
pub use crate::metric::Metric;
pub use crate::model::LinearModel;
pub use crate::qrel::{JudgmentSet, QueryJudgments};
pub use crate::status::{Status, StatusCode};
pub use crate::train::{template, ModelParams, TrainRequest};
