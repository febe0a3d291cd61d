//! Per-column min-max rescaling over one batch.
//!
//! Min and max are taken over the current batch only; nothing is learned or
//! carried across runs. An all-equal column (including a single-entry batch)
//! fixes the denominator to 1.0, so every scaled value collapses to 0.0.

use super::features::FeatureRow;

/// Min-max scale one column to `[0, 1]`.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;
    let denom = if spread != 0.0 { spread } else { 1.0 };
    values.iter().map(|v| (v - min) / denom).collect()
}

fn scale_column(
    rows: &mut [FeatureRow],
    get: impl Fn(&FeatureRow) -> f64,
    set: impl Fn(&mut FeatureRow, f64),
) {
    let raw: Vec<f64> = rows.iter().map(&get).collect();
    let scaled = min_max_scale(&raw);
    for (row, v) in rows.iter_mut().zip(scaled) {
        set(row, v);
    }
}

/// Fill in the scaled counterpart of every signal column.
pub fn scale_rows(rows: &mut [FeatureRow]) {
    scale_column(rows, |r| r.vis, |r, v| r.vis_scaled = v);
    scale_column(rows, |r| r.sem, |r, v| r.sem_scaled = v);
    scale_column(rows, |r| r.auth, |r, v| r.auth_scaled = v);
    scale_column(rows, |r| r.feat, |r, v| r.feat_scaled = v);
    scale_column(rows, |r| r.est_clicks, |r, v| r.est_clicks_scaled = v);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_column_spans_zero_to_one() {
        let scaled = min_max_scale(&[2.0, 4.0, 6.0]);
        assert!((scaled[0]).abs() < 1e-12);
        assert!((scaled[1] - 0.5).abs() < 1e-12);
        assert!((scaled[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_equal_column_collapses_to_zero() {
        let scaled = min_max_scale(&[3.0, 3.0, 3.0]);
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn single_value_collapses_to_zero() {
        assert_eq!(min_max_scale(&[7.5]), vec![0.0]);
    }

    #[test]
    fn negative_inputs_scale_cleanly() {
        let scaled = min_max_scale(&[-2.0, 0.0, 2.0]);
        assert!((scaled[0]).abs() < 1e-12);
        assert!((scaled[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scale_rows_touches_every_column() {
        let mut rows = vec![
            FeatureRow {
                vis: 1.0,
                sem: 0.2,
                feat: 0.6,
                ..FeatureRow::default()
            },
            FeatureRow {
                vis: 0.5,
                sem: 0.8,
                feat: 0.0,
                ..FeatureRow::default()
            },
        ];
        scale_rows(&mut rows);
        assert!((rows[0].vis_scaled - 1.0).abs() < 1e-12);
        assert!((rows[1].vis_scaled).abs() < 1e-12);
        assert!((rows[0].sem_scaled).abs() < 1e-12);
        assert!((rows[1].sem_scaled - 1.0).abs() < 1e-12);
        assert!((rows[0].feat_scaled - 1.0).abs() < 1e-12);
        // Constant placeholder columns collapse to zero.
        assert_eq!(rows[0].auth_scaled, 0.0);
        assert_eq!(rows[1].est_clicks_scaled, 0.0);
    }
}
