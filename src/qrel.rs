//! Externally supplied relevance judgments
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Judged documents of a single query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryJudgments {
    docid_to_rel: Arc<BTreeMap<String, f64>>,
}

impl QueryJudgments {
    /// Wraps a document to grade mapping.
    pub fn new(docid_to_rel: BTreeMap<String, f64>) -> Self {
        QueryJudgments {
            docid_to_rel: Arc::new(docid_to_rel),
        }
    }

    /// Number of judged documents.
    pub fn num_judged(&self) -> usize {
        self.docid_to_rel.len()
    }

    /// Number of documents with a positive grade.
    pub fn num_relevant(&self) -> usize {
        self.docid_to_rel.values().filter(|&&g| g > 0.0).count()
    }

    /// Grade of `docid` (`0` when unjudged). Negative grades count as `0`.
    pub fn gain(&self, docid: &str) -> f64 {
        self.docid_to_rel
            .get(docid)
            .copied()
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// All positive grades, in no particular order.
    pub fn relevant_gains(&self) -> Vec<f64> {
        self.docid_to_rel
            .values()
            .copied()
            .filter(|&g| g > 0.0)
            .collect()
    }

    /// Judged documents and their grades.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.docid_to_rel.iter().map(|(d, &g)| (d.as_str(), g))
    }
}

/// Judgments for a set of queries, keyed by query id then document name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgmentSet {
    query_to_judgments: Arc<BTreeMap<String, QueryJudgments>>,
}

impl JudgmentSet {
    /// Builds a judgment set from nested maps.
    pub fn new(data: BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        let query_to_judgments = data
            .into_iter()
            .map(|(qid, docs)| (qid, QueryJudgments::new(docs)))
            .collect();
        JudgmentSet {
            query_to_judgments: Arc::new(query_to_judgments),
        }
    }

    /// Reads TREC qrel lines: `qid iteration docid grade`.
    ///
    /// Blank lines are skipped. A later line for the same document overrides an earlier one.
    pub fn read_qrels<R: BufRead>(reader: R) -> Result<Self> {
        let mut output: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (num, line) in reader.lines().enumerate() {
            let line = line?;
            let row: Vec<&str> = line.split_whitespace().collect();
            if row.is_empty() {
                continue;
            }
            if row.len() != 4 {
                return Err(Error::MalformedJudgments {
                    line: num + 1,
                    reason: format!("expected 4 columns, found {}", row.len()),
                });
            }
            let gain = row[3]
                .parse::<f64>()
                .ok()
                .filter(|g| g.is_finite())
                .ok_or_else(|| Error::MalformedJudgments {
                    line: num + 1,
                    reason: format!("invalid relevance judgment {:?}", row[3]),
                })?;
            output
                .entry(row[0].to_string())
                .or_default()
                .insert(row[2].to_string(), gain);
        }
        Ok(JudgmentSet::new(output))
    }

    /// Parses the structured (JSON) representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Produces the structured (JSON) representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Judged query ids in ascending order.
    pub fn queries(&self) -> impl Iterator<Item = &str> + '_ {
        self.query_to_judgments.keys().map(String::as_str)
    }

    /// Judgments of `qid`, if the query was judged.
    pub fn get(&self, qid: &str) -> Option<&QueryJudgments> {
        self.query_to_judgments.get(qid)
    }

    /// Number of judged queries.
    pub fn len(&self) -> usize {
        self.query_to_judgments.len()
    }

    /// Returns `true` if no query was judged.
    pub fn is_empty(&self) -> bool {
        self.query_to_judgments.is_empty()
    }
}
