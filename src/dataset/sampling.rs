use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::Dataset;
use crate::error::{Error, Result};
use crate::feature::FeatureId;

impl Dataset {
    /// Keeps only the instances of the given queries.
    ///
    /// The feature catalog is carried over unchanged. Fails with
    /// [`Error::UnknownQuery`] on the first id that is not present.
    pub fn subsample_queries<S: AsRef<str>>(&self, qids: &[S]) -> Result<Dataset> {
        let mut keep = BTreeSet::new();
        for qid in qids {
            let qid = qid.as_ref();
            let idxs = self
                .instances_for(qid)
                .ok_or_else(|| Error::UnknownQuery(qid.to_string()))?;
            keep.extend(idxs.iter().copied());
        }
        let instances = keep
            .into_iter()
            .map(|idx| self.instances[idx].clone())
            .collect();
        debug!(queries = qids.len(), "subsampled queries");
        Dataset::with_catalog(instances, self.catalog.clone())
    }

    /// Restricts every instance to the named features.
    ///
    /// Names may also be given as decimal ids. Feature ids keep their
    /// values; unselected ids vanish from both the catalog and the instances.
    pub fn subsample_feature_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut keep = names
            .iter()
            .map(|name| self.catalog.lookup(name.as_ref()))
            .collect::<Result<Vec<FeatureId>>>()?;
        keep.sort();
        keep.dedup();
        let instances = self
            .instances
            .iter()
            .map(|inst| inst.restricted(&keep))
            .collect();
        debug!(features = keep.len(), "subsampled features");
        Dataset::with_catalog(instances, self.catalog.restrict(&keep))
    }

    /// Keeps a seeded random share of the queries.
    ///
    /// `fraction` must lie in `(0, 1]`; at least one query is kept.
    pub fn sample_queries(&self, fraction: f64, seed: u64) -> Result<Dataset> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::InvalidConfiguration {
                parameter: "fraction",
                reason: format!("must lie in (0, 1], got {fraction}"),
            });
        }
        let qids: Vec<&str> = self.queries().collect();
        let amount = ((qids.len() as f64 * fraction).ceil() as usize).clamp(1, qids.len().max(1));
        let mut rng = StdRng::seed_from_u64(seed);
        let chosen: Vec<&str> = qids.choose_multiple(&mut rng, amount).copied().collect();
        self.subsample_queries(&chosen)
    }
}
