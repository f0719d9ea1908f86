/// Average precision of a ranking.
///
/// Precision is taken at every rank holding a relevant document and the sum
/// is divided by `num_relevant`, the number of relevant documents of the query
/// (which may exceed those ranked). Returns `0` when there are none.
pub fn average_precision(ranked_gains: &[f64], num_relevant: f64) -> f64 {
    if num_relevant <= 0.0 {
        return 0.0;
    }
    let mut found = 0usize;
    let mut sum_precision = 0.0;
    for (i, &gain) in ranked_gains.iter().enumerate() {
        if gain > 0.0 {
            found += 1;
            sum_precision += found as f64 / (i + 1) as f64;
        }
    }
    sum_precision / num_relevant
}

/// Reciprocal of the rank of the first relevant document, `0` if none is ranked.
pub fn reciprocal_rank(ranked_gains: &[f64]) -> f64 {
    ranked_gains
        .iter()
        .position(|&gain| gain > 0.0)
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}
