//! Softmax normalization of logits into per-domain shares.

/// Guard against an all-zero exponential sum in degenerate batches.
pub const SOFTMAX_EPSILON: f64 = 1e-12;

/// Numerically stable softmax over one batch of logits.
///
/// The batch maximum is subtracted before exponentiating so arbitrarily large
/// or negative logits cannot overflow. Shares are non-negative and sum to 1
/// within floating-point tolerance; the epsilon in the denominator leaves the
/// sum marginally below 1 in the degenerate all-equal case.
pub fn softmax_shares(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let denom: f64 = exps.iter().sum::<f64>() + SOFTMAX_EPSILON;
    exps.iter().map(|e| e / denom).collect()
}

/// Apportion an external total volume across shares. Pure multiplication,
/// owned by the caller of the normalizer.
pub fn apportion_volume(shares: &[f64], total_volume: f64) -> Vec<f64> {
    shares.iter().map(|s| s * total_volume).collect()
}
