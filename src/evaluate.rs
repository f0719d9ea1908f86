//! Per-query evaluation of rankings
use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::instrument;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::model::LinearModel;
use crate::qrel::JudgmentSet;

/// A query prepared for repeated evaluation: its instances, their grades and the metric normalizer.
#[derive(Debug, Clone)]
struct PreparedQuery {
    qid: String,
    instances: Vec<usize>,
    gains: Vec<f64>,
    normalizer: f64,
}

/// Scores rankings of a [`Dataset`] under one [`Metric`].
///
/// Grades are resolved once. A query present in the judgments takes the
/// judged grade of each named document; unjudged and unnamed documents of
/// such a query count as `0`. Unjudged queries keep the grades stored in the
/// dataset. Normalizers of judged queries count every judged document,
/// retrieved or not.
#[derive(Debug, Clone)]
pub struct Evaluator {
    metric: Metric,
    queries: Vec<PreparedQuery>,
}

impl Evaluator {
    /// Prepares the queries of `dataset` for `metric`.
    pub fn new(dataset: &Dataset, metric: Metric, judgments: Option<&JudgmentSet>) -> Self {
        let queries = dataset
            .query_groups()
            .iter()
            .map(|(qid, instances)| {
                let judged = judgments.and_then(|j| j.get(qid));
                let gains: Vec<f64> = instances
                    .iter()
                    .map(|&idx| {
                        let inst = &dataset.instances()[idx];
                        match judged {
                            Some(judged) => inst.name().map_or(0.0, |name| judged.gain(name)),
                            None => inst.gain(),
                        }
                    })
                    .collect();
                let relevant = match judged {
                    Some(judged) => judged.relevant_gains(),
                    None => gains.iter().copied().filter(|&g| g > 0.0).collect(),
                };
                PreparedQuery {
                    qid: qid.clone(),
                    instances: instances.clone(),
                    gains,
                    normalizer: metric.normalizer(relevant),
                }
            })
            .collect();
        Evaluator { metric, queries }
    }

    /// Parses `metric_name` and prepares the evaluator.
    pub fn from_name(
        dataset: &Dataset,
        metric_name: &str,
        judgments: Option<&JudgmentSet>,
    ) -> Result<Self> {
        let metric = metric_name.parse()?;
        Ok(Self::new(dataset, metric, judgments))
    }

    /// The metric being computed.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of queries evaluated.
    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    fn query_value(&self, query: &PreparedQuery, scores: &[f64]) -> f64 {
        let order = rank(&query.instances, scores);
        let ranked_gains: Vec<f64> = order.iter().map(|&pos| query.gains[pos]).collect();
        self.metric.score(&ranked_gains, query.normalizer)
    }

    /// Metric value of every query, in ascending query order.
    ///
    /// `scores` holds one score per dataset instance.
    pub fn query_values(&self, scores: &[f64]) -> Vec<f64> {
        self.queries
            .iter()
            .map(|query| self.query_value(query, scores))
            .collect()
    }

    /// Mean metric value over all queries, summed in ascending query order.
    pub fn mean(&self, scores: &[f64]) -> f64 {
        mean(&self.query_values(scores))
    }

    /// Metric value keyed by query id; queries are evaluated in parallel.
    pub fn by_query(&self, scores: &[f64]) -> BTreeMap<String, f64> {
        let values: Vec<f64> = self
            .queries
            .par_iter()
            .map(|query| self.query_value(query, scores))
            .collect();
        self.queries
            .iter()
            .map(|query| query.qid.clone())
            .zip(values)
            .collect()
    }
}

/// Positions of `instances` ordered by descending score.
///
/// Ties keep their order in `instances`; NaN scores rank last.
pub fn rank(instances: &[usize], scores: &[f64]) -> Vec<usize> {
    let key = |pos: usize| {
        let s = scores[instances[pos]];
        if s.is_nan() {
            f64::NEG_INFINITY
        } else {
            s
        }
    };
    let mut order: Vec<usize> = (0..instances.len()).collect();
    order.sort_by(|&a, &b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    order
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    for v in values {
        sum += v;
    }
    sum / values.len() as f64
}

impl Dataset {
    /// Metric value per query for the rankings produced by `model`.
    ///
    /// Every query of the dataset gets an entry, whether or not `judgments` covers it.
    #[instrument(skip(self, model, judgments), fields(queries = self.num_queries()))]
    pub fn evaluate(
        &self,
        model: &LinearModel,
        metric_name: &str,
        judgments: Option<&JudgmentSet>,
    ) -> Result<BTreeMap<String, f64>> {
        let evaluator = Evaluator::from_name(self, metric_name, judgments)?;
        if evaluator.num_queries() == 0 {
            return Err(Error::EmptyDataset);
        }
        let scores = self.predict_scores(model);
        Ok(evaluator.by_query(&scores))
    }

    /// Mean metric value over all queries.
    pub fn evaluate_mean(
        &self,
        model: &LinearModel,
        metric_name: &str,
        judgments: Option<&JudgmentSet>,
    ) -> Result<f64> {
        let values: Vec<f64> = self
            .evaluate(model, metric_name, judgments)?
            .into_values()
            .collect();
        Ok(mean(&values))
    }
}
