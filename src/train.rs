//! Training requests and named configuration templates
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ca::{self, LogObserver, Observer, Silent};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::evaluate::Evaluator;
use crate::model::LinearModel;
use crate::qrel::JudgmentSet;

/// Metric optimized when a request names none.
pub const DEFAULT_MEASURE: &str = "ndcg@5";

/// Names accepted by [`template`].
pub const TEMPLATES: &[&str] = &["coordinate_ascent_defaults"];

fn default_measure() -> String {
    DEFAULT_MEASURE.to_string()
}

/// Algorithm-specific training parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModelParams {
    /// Parameters of [`ca::solve`]
    CoordinateAscent(ca::Params),
}

/// Everything needed to train a model on a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    /// Name of the metric to optimize, e.g. `ndcg@5`
    #[serde(default = "default_measure")]
    pub measure: String,
    /// Algorithm and its parameters
    pub params: ModelParams,
    /// Grades to optimize against instead of the dataset's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgments: Option<JudgmentSet>,
}

impl TrainRequest {
    /// A coordinate ascent request optimizing [`DEFAULT_MEASURE`].
    pub fn coordinate_ascent(params: ca::Params) -> Self {
        TrainRequest {
            measure: default_measure(),
            params: ModelParams::CoordinateAscent(params),
            judgments: None,
        }
    }

    /// Optimizes `measure` instead.
    pub fn with_measure(mut self, measure: &str) -> Self {
        self.measure = measure.to_string();
        self
    }

    /// Optimizes against `judgments` instead of the dataset's grades.
    pub fn with_judgments(mut self, judgments: JudgmentSet) -> Self {
        self.judgments = Some(judgments);
        self
    }

    /// Parses the structured (JSON) representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Produces the structured (JSON) representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Looks up a named baseline request.
pub fn template(name: &str) -> Result<TrainRequest> {
    match name {
        "coordinate_ascent_defaults" => Ok(TrainRequest::coordinate_ascent(ca::Params::new())),
        _ => Err(Error::UnknownTemplate(name.to_string())),
    }
}

impl Dataset {
    /// Trains a model as described by `request`.
    ///
    /// Nothing is trained unless the parameters and the measure are valid
    /// and the dataset has at least one query.
    pub fn train_model(&self, request: &TrainRequest) -> Result<LinearModel> {
        let evaluator = Evaluator::from_name(self, &request.measure, request.judgments.as_ref())?;
        match &request.params {
            ModelParams::CoordinateAscent(params) => {
                let observer: &dyn Observer = if params.quiet { &Silent } else { &LogObserver };
                let status = ca::solve(self, &evaluator, params, observer)?;
                if !params.quiet {
                    info!(
                        measure = %evaluator.metric(),
                        value = status.value,
                        restart = status.restart,
                        "training finished"
                    );
                }
                Ok(LinearModel::new(status.weights))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template() {
        let request = template("coordinate_ascent_defaults").unwrap();
        assert_eq!(request.measure, "ndcg@5");
        assert_eq!(request.params, ModelParams::CoordinateAscent(ca::Params::new()));
        assert!(matches!(
            template("lambdamart_defaults"),
            Err(Error::UnknownTemplate(name)) if name == "lambdamart_defaults"
        ));
    }

    #[test]
    fn json_layout() {
        let json = r#"{"params": {"CoordinateAscent": {"num_restarts": 1, "init_random": true}}}"#;
        let request = TrainRequest::from_json(json).unwrap();
        assert_eq!(request.measure, DEFAULT_MEASURE);
        let ModelParams::CoordinateAscent(params) = &request.params;
        assert_eq!(params.num_restarts, 1);
        assert!(params.init_random);
        assert!(request.judgments.is_none());
        assert_eq!(TrainRequest::from_json(&request.to_json().unwrap()).unwrap(), request);
    }

    #[test]
    fn unknown_measure_fails_before_training() {
        let ds = crate::dataset::tests::toy();
        let request = template("coordinate_ascent_defaults")
            .unwrap()
            .with_measure("err@3");
        assert!(matches!(ds.train_model(&request), Err(Error::UnknownMetric(_))));
    }
}
