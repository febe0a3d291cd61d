//! Weighted combination of scaled signals into one scalar per entry.

use super::features::FeatureRow;
use super::weights::ShareWeights;

/// Combine one row's scaled signals into a logit.
///
/// The clicks term is log-transformed; scaled clicks sit in `[0, 1]`, so the
/// log argument stays in `[1, 2]` and `ln(0)` cannot occur. Weights may be
/// zero or negative.
pub fn combine(row: &FeatureRow, weights: &ShareWeights) -> f64 {
    weights.vis * row.vis_scaled
        + weights.sem * row.sem_scaled
        + weights.auth * row.auth_scaled
        + weights.feat * row.feat_scaled
        + weights.clicks * (row.est_clicks_scaled + 1.0).ln()
}

/// Logits for a whole batch, in entry order.
pub fn combine_all(rows: &[FeatureRow], weights: &ShareWeights) -> Vec<f64> {
    rows.iter().map(|row| combine(row, weights)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vis: f64, sem: f64, feat: f64, clicks: f64) -> FeatureRow {
        FeatureRow {
            vis_scaled: vis,
            sem_scaled: sem,
            feat_scaled: feat,
            est_clicks_scaled: clicks,
            ..FeatureRow::default()
        }
    }

    #[test]
    fn zero_weights_give_zero_logit() {
        let w = ShareWeights::from_slice(&[0.0; 5]).unwrap();
        assert_eq!(combine(&row(1.0, 1.0, 1.0, 1.0), &w), 0.0);
    }

    #[test]
    fn weighted_sum_matches_by_hand() {
        let w = ShareWeights::from_slice(&[2.0, 1.0, 1.0, 0.5, 1.0]).unwrap();
        let r = row(0.5, 0.4, 1.0, 0.0);
        // 2*0.5 + 1*0.4 + 0.5*1 + ln(1) = 1.9
        assert!((combine(&r, &w) - 1.9).abs() < 1e-12);
    }

    #[test]
    fn zero_scaled_clicks_contribute_nothing() {
        let w = ShareWeights::from_slice(&[0.0, 0.0, 0.0, 0.0, 3.0]).unwrap();
        assert_eq!(combine(&row(1.0, 1.0, 1.0, 0.0), &w), 0.0);
    }

    #[test]
    fn clicks_term_uses_the_log_transform() {
        let w = ShareWeights::from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        let got = combine(&row(0.0, 0.0, 0.0, 1.0), &w);
        assert!((got - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn negative_weights_flip_the_signal() {
        let w = ShareWeights::from_slice(&[-1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(combine(&row(0.8, 0.0, 0.0, 0.0), &w) < 0.0);
    }

    #[test]
    fn batch_order_is_preserved() {
        let w = ShareWeights::default();
        let rows = vec![row(1.0, 0.0, 0.0, 0.0), row(0.0, 0.0, 0.0, 0.0)];
        let logits = combine_all(&rows, &w);
        assert_eq!(logits.len(), 2);
        assert!(logits[0] > logits[1]);
    }
}
