//! Error types shared by every part of the crate.
use thiserror::Error;

/// Errors that can occur while building datasets, training or evaluating models.
#[derive(Debug, Error)]
pub enum Error {
    /// A training parameter is out of range
    #[error("invalid configuration: {parameter} {reason}")]
    InvalidConfiguration {
        /// Name of the offending parameter
        parameter: &'static str,
        /// What is wrong with its value
        reason: String,
    },
    /// There are no queries to train or evaluate on
    #[error("dataset contains no queries")]
    EmptyDataset,
    /// A requested query id is not part of the dataset
    #[error("unknown query: {0:?}")]
    UnknownQuery(String),
    /// A requested feature name (or number) is not registered
    #[error("unknown feature: {0:?}")]
    UnknownFeature(String),
    /// Two feature ids were given the same name
    #[error("feature name {name:?} used by both feature {first} and feature {second}")]
    DuplicateFeatureName {
        /// The shared name
        name: String,
        /// Id that registered the name first
        first: u32,
        /// Id that tried to reuse it
        second: u32,
    },
    /// A relevance grade is negative or not a number
    #[error("invalid relevance grade {grade} in query {qid:?}")]
    InvalidGrade {
        /// Query of the offending instance
        qid: String,
        /// The rejected grade
        grade: f64,
    },
    /// A feature value is NaN or infinite
    #[error("invalid value {value} of feature {feature} in query {qid:?}")]
    InvalidFeatureValue {
        /// Query of the offending instance
        qid: String,
        /// Feature holding the value
        feature: u32,
        /// The rejected value
        value: f64,
    },
    /// Dense inputs disagree in their dimensions
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Which input is inconsistent
        what: &'static str,
        /// Length implied by the other inputs
        expected: usize,
        /// Length actually supplied
        found: usize,
    },
    /// The metric name could not be parsed
    #[error("unknown metric: {0:?}")]
    UnknownMetric(String),
    /// A structured model is missing fields or has non-numeric weights
    #[error("malformed model: {0}")]
    MalformedModel(String),
    /// A qrel line could not be parsed
    #[error("malformed judgments at line {line}: {reason}")]
    MalformedJudgments {
        /// 1-based line number
        line: usize,
        /// What is wrong with the line
        reason: String,
    },
    /// No configuration template has the given name
    #[error("unknown configuration template: {0:?}")]
    UnknownTemplate(String),
    /// Structured (de)serialization failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Reading or writing failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
