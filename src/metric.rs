//! Ranking quality metrics
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

mod ndcg;
mod precision;

pub use ndcg::{dcg, ndcg};
pub use precision::{average_precision, reciprocal_rank};

/// A ranking metric, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Normalized discounted cumulative gain, optionally cut off at `depth`
    Ndcg {
        /// Number of top positions considered (`None` for all)
        depth: Option<usize>,
    },
    /// Average precision (grade > 0 is relevant)
    AveragePrecision,
    /// Reciprocal rank of the first relevant document
    ReciprocalRank,
}

impl Metric {
    /// Query normalizer from the grades of all relevant documents.
    ///
    /// For NDCG this is the ideal DCG, for average precision the number of
    /// relevant documents.
    pub fn normalizer(&self, mut relevant_gains: Vec<f64>) -> f64 {
        match *self {
            Metric::Ndcg { depth } => {
                relevant_gains.sort_by(|a, b| b.total_cmp(a));
                dcg(&relevant_gains, depth)
            }
            Metric::AveragePrecision => relevant_gains.len() as f64,
            Metric::ReciprocalRank => 1.0,
        }
    }

    /// Value for one query given the grades in ranked order.
    pub fn score(&self, ranked_gains: &[f64], normalizer: f64) -> f64 {
        match *self {
            Metric::Ndcg { depth } => ndcg(ranked_gains, depth, normalizer),
            Metric::AveragePrecision => average_precision(ranked_gains, normalizer),
            Metric::ReciprocalRank => reciprocal_rank(ranked_gains),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    /// Parses `ndcg`, `ndcg@k`, `map`/`ap` and `rr`/`mrr`, ignoring case.
    fn from_str(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let unknown = || Error::UnknownMetric(name.to_string());
        match lower.as_str() {
            "ndcg" => Ok(Metric::Ndcg { depth: None }),
            "map" | "ap" => Ok(Metric::AveragePrecision),
            "rr" | "mrr" => Ok(Metric::ReciprocalRank),
            other => {
                let depth = other.strip_prefix("ndcg@").ok_or_else(unknown)?;
                match depth.parse::<usize>() {
                    Ok(depth) if depth > 0 => Ok(Metric::Ndcg { depth: Some(depth) }),
                    _ => Err(unknown()),
                }
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Ndcg { depth: Some(k) } => write!(f, "ndcg@{k}"),
            Metric::Ndcg { depth: None } => write!(f, "ndcg"),
            Metric::AveragePrecision => write!(f, "map"),
            Metric::ReciprocalRank => write!(f, "rr"),
        }
    }
}
