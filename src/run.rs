//! TREC run output
use std::io::Write;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::evaluate::rank;
use crate::model::LinearModel;

impl Dataset {
    /// Writes the model's ranking of every query as TREC run lines.
    ///
    /// Each line reads `qid Q0 docid rank score system`; at most `depth`
    /// documents are written per query (`None` for all). Instances without a
    /// document name are written as `<qid>-<instance index>`. Returns the
    /// number of lines written.
    pub fn write_trecrun<W: Write>(
        &self,
        model: &LinearModel,
        out: &mut W,
        system_name: &str,
        depth: Option<usize>,
    ) -> Result<usize> {
        let scores = self.predict_scores(model);
        let mut written = 0;
        for (qid, instances) in self.query_groups() {
            let order = rank(instances, &scores);
            let depth = depth.unwrap_or(order.len());
            for (i, &pos) in order.iter().take(depth).enumerate() {
                let idx = instances[pos];
                let docid = match self.instances()[idx].name() {
                    Some(name) => name.to_string(),
                    None => format!("{qid}-{idx}"),
                };
                writeln!(
                    out,
                    "{} Q0 {} {} {} {}",
                    qid,
                    docid,
                    i + 1,
                    scores[idx],
                    system_name
                )?;
                written += 1;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::tests::{features, toy};
    use crate::dataset::{Dataset, Instance};
    use crate::feature::FeatureId;
    use crate::model::LinearModel;
    use std::collections::BTreeMap;

    fn bm25() -> LinearModel {
        let mut weights = BTreeMap::new();
        weights.insert(FeatureId::from(0), 1.0);
        LinearModel::new(weights)
    }

    #[test]
    fn writes_ranked_lines() {
        let mut out = Vec::new();
        let n = toy().write_trecrun(&bm25(), &mut out, "ca", Some(2)).unwrap();
        assert_eq!(n, 4);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "q1 Q0 d1 1 1 ca",
                "q1 Q0 d4 2 0.6 ca",
                "q2 Q0 d5 1 0.3 ca",
                "q2 Q0 d3 2 0 ca",
            ]
        );
    }

    #[test]
    fn unnamed_documents() {
        let ds = Dataset::from_instances(
            vec![Instance::new("7", 1.0, features(&[(0, 1.0)]))],
            None,
        )
        .unwrap();
        let mut out = Vec::new();
        ds.write_trecrun(&bm25(), &mut out, "x", None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "7 Q0 7-0 1 1 x\n");
    }
}
