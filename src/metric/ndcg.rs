/// Discounted cumulative gain of grades in ranked order.
///
/// `DCG = Σ (2^g_i − 1) / log2(i + 1)` over the first `depth` positions (1-based `i`).
pub fn dcg(gains: &[f64], depth: Option<usize>) -> f64 {
    let depth = depth.unwrap_or(gains.len());
    let mut sum = 0.0;
    for (i, &gain) in gains.iter().enumerate().take(depth) {
        sum += (2f64.powf(gain) - 1.0) / (i as f64 + 2.0).log2();
    }
    sum
}

/// NDCG of a ranking, given the ideal DCG of the query.
///
/// Queries without relevant documents (`ideal == 0`) score `0`.
pub fn ndcg(ranked_gains: &[f64], depth: Option<usize>, ideal: f64) -> f64 {
    if ideal <= 0.0 {
        return 0.0;
    }
    dcg(ranked_gains, depth) / ideal
}
