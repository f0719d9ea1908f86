use std::collections::{BTreeMap, HashMap};

use ndarray::{ArrayView1, ArrayView2};

use super::{Dataset, Instance};
use crate::error::{Error, Result};
use crate::feature::{FeatureCatalog, FeatureId};

/// Numeric element types accepted by [`Dataset::from_dense`].
pub trait AsF64: Copy {
    /// Widens the value to `f64`; 64-bit integers may round.
    fn as_f64(self) -> f64;
}

macro_rules! impl_as_f64 {
    ($($t:ty),*) => {
        $(impl AsF64 for $t {
            fn as_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_as_f64!(f32, f64, i32, i64);

/// Feature ids are `u32`, so this many columns at most.
const MAX_COLUMNS: u64 = u32::MAX as u64 + 1;

impl Dataset {
    /// Builds a dataset from a dense feature matrix, a label vector and a query-id vector.
    ///
    /// Column `j` becomes feature id `j`. Zero entries are not stored.
    /// Query ids are named through `qid_names` when given, by their
    /// decimal value otherwise.
    pub fn from_dense<A, Y, Q>(
        x: ArrayView2<'_, A>,
        y: ArrayView1<'_, Y>,
        qids: ArrayView1<'_, Q>,
        qid_names: Option<&HashMap<i64, String>>,
    ) -> Result<Dataset>
    where
        A: AsF64,
        Y: AsF64,
        Q: Copy + Into<i64>,
    {
        let (n, d) = x.dim();
        if y.len() != n {
            return Err(Error::ShapeMismatch {
                what: "labels",
                expected: n,
                found: y.len(),
            });
        }
        if qids.len() != n {
            return Err(Error::ShapeMismatch {
                what: "query ids",
                expected: n,
                found: qids.len(),
            });
        }
        if d as u64 > MAX_COLUMNS {
            return Err(Error::ShapeMismatch {
                what: "feature columns",
                expected: usize::try_from(MAX_COLUMNS).unwrap_or(usize::MAX),
                found: d,
            });
        }

        let mut catalog = FeatureCatalog::new();
        for j in 0..d {
            catalog.insert(FeatureId::from_index(j), None)?;
        }

        let mut instances = Vec::with_capacity(n);
        for ((row, &yi), &qi) in x.outer_iter().zip(y.iter()).zip(qids.iter()) {
            let features: BTreeMap<FeatureId, f64> = row
                .iter()
                .enumerate()
                .map(|(j, &xij)| (FeatureId::from_index(j), xij.as_f64()))
                .filter(|&(_, xij)| xij != 0.0)
                .collect();
            let qid: i64 = qi.into();
            let qid = qid_names
                .and_then(|names| names.get(&qid).cloned())
                .unwrap_or_else(|| qid.to_string());
            instances.push(Instance::new(qid, yi.as_f64(), features));
        }
        Dataset::with_catalog(instances, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn dense_columns_become_features() {
        let x = array![[1.0f32, 0.0, 2.0], [0.5, 0.25, 0.0], [0.0, 0.0, 1.0]];
        let y = array![1.0f32, 0.0, 2.0];
        let qids = array![10i32, 10, 11];
        let ds = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap();
        assert_eq!(ds.num_instances(), 3);
        assert_eq!(ds.num_features(), 3);
        assert_eq!(ds.feature_names(), vec!["0", "1", "2"]);
        assert_eq!(ds.queries().collect::<Vec<_>>(), vec!["10", "11"]);
        let first = ds.instance(0).unwrap();
        assert_eq!(first.features().len(), 2);
        assert_eq!(first.get(FeatureId::from(1)), 0.0);
        assert_eq!(first.get(FeatureId::from(2)), 2.0);
    }

    #[test]
    fn named_queries() {
        let x = array![[1.0f64], [2.0]];
        let y = array![0.0f64, 1.0];
        let qids = array![3i64, 4];
        let mut names = HashMap::new();
        names.insert(3i64, "topic-3".to_string());
        let ds = Dataset::from_dense(x.view(), y.view(), qids.view(), Some(&names)).unwrap();
        assert_eq!(ds.queries().collect::<Vec<_>>(), vec!["4", "topic-3"]);
    }

    #[test]
    fn integer_matrices_and_labels() {
        let x = array![[3i64, 0], [0, 7]];
        let y = array![2i64, 0];
        let qids = array![1i32, 1];
        let ds = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap();
        assert_eq!(ds.instance(0).unwrap().get(FeatureId::from(0)), 3.0);
        assert_eq!(ds.instance(1).unwrap().get(FeatureId::from(1)), 7.0);
        assert_eq!(ds.instance(0).unwrap().gain(), 2.0);

        let x = array![[1i32], [2]];
        let y = array![1i32, 0];
        let ds = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap();
        assert_eq!(ds.num_features(), 1);
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let x = array![[1.0f64, f64::NAN]];
        let y = array![1.0f64];
        let qids = array![5i64];
        let err = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidFeatureValue { feature: 1, .. }));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn too_many_columns_fail() {
        // no rows, so nothing is allocated
        let x = Array2::<f64>::zeros((0, (1usize << 32) + 1));
        let y: Array1<f64> = Array1::zeros(0);
        let qids: Array1<i64> = Array1::zeros(0);
        let err = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch { what: "feature columns", expected, .. } if expected == 1 << 32
        ));
    }

    #[test]
    fn mismatched_shapes_fail() {
        let x = array![[1.0f64, 2.0], [3.0, 4.0]];
        let y: Array1<f64> = array![1.0];
        let qids = array![1i64, 1];
        let err = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch { what: "labels", expected: 2, found: 1 }
        ));

        let y = array![1.0f64, 0.0];
        let qids = array![1i64, 1, 2];
        let err = Dataset::from_dense(x.view(), y.view(), qids.view(), None).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { what: "query ids", .. }));
    }
}
