//! Raw per-result signal extraction.
//!
//! Five signals per entry: rank visibility, authority, SERP-feature score,
//! estimated clicks, and semantic similarity. Authority and estimated clicks
//! are reserved signals that stay at a constant 0.0 until a real data source
//! backs them; scaling and softmax depend on them collapsing to a constant.

use crate::error::EstimateError;
use crate::relevance::SimilarityScorer;
use crate::serp::ResultEntry;
use serde::Serialize;

/// Featured-snippet contribution to the SERP-feature score.
pub const FEATURED_SNIPPET_BOOST: f64 = 0.6;
/// People-also-ask contribution to the SERP-feature score.
pub const PEOPLE_ALSO_ASK_BOOST: f64 = 0.4;

/// Raw and scaled signal values for one entry. Computed once per run; the
/// scaled columns are filled in by the scaler and not mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeatureRow {
    pub vis: f64,
    pub sem: f64,
    pub auth: f64,
    pub feat: f64,
    pub est_clicks: f64,
    pub vis_scaled: f64,
    pub sem_scaled: f64,
    pub auth_scaled: f64,
    pub feat_scaled: f64,
    pub est_clicks_scaled: f64,
}

/// Rank visibility: `exp(-alpha * (rank - 1))`, 0.0 when the rank is missing.
///
/// Bounded in (0, 1] with `visibility(1) == 1`; strictly decreasing in rank
/// for `alpha > 0`. Ranks below 1 are clamped to 1.
pub fn visibility(rank: Option<u32>, alpha: f64) -> f64 {
    match rank {
        Some(r) => {
            let r = r.max(1) as f64;
            (-alpha * (r - 1.0)).exp()
        }
        None => 0.0,
    }
}

/// Indicator-sum SERP-feature score, clamped to 1.0.
pub fn serp_feature_score(entry: &ResultEntry) -> f64 {
    let mut score = 0.0;
    if entry.is_featured_snippet {
        score += FEATURED_SNIPPET_BOOST;
    }
    if entry.in_people_also_ask {
        score += PEOPLE_ALSO_ASK_BOOST;
    }
    score.min(1.0)
}

/// Compute one [`FeatureRow`] per entry.
///
/// The scorer is called once for the whole batch with the concatenated
/// title + description of every entry. Fails with a validation error for an
/// empty batch, for a batch where every entry is missing its rank, and for a
/// scorer that is not length-preserving.
pub fn extract_features(
    entries: &[ResultEntry],
    query: &str,
    alpha: f64,
    scorer: &dyn SimilarityScorer,
) -> Result<Vec<FeatureRow>, EstimateError> {
    if entries.is_empty() {
        return Err(EstimateError::Validation("empty result batch".to_string()));
    }
    if entries.iter().all(|e| e.rank.is_none()) {
        return Err(EstimateError::Validation(
            "rank missing from every entry".to_string(),
        ));
    }

    let texts: Vec<String> = entries.iter().map(|e| e.semantic_text()).collect();
    let sims = scorer.score(query, &texts);
    if sims.len() != entries.len() {
        return Err(EstimateError::Validation(format!(
            "scorer '{}' returned {} similarities for {} entries",
            scorer.name(),
            sims.len(),
            entries.len()
        )));
    }

    let rows = entries
        .iter()
        .zip(sims)
        .map(|(entry, sem)| FeatureRow {
            vis: visibility(entry.rank, alpha),
            sem,
            auth: 0.0,
            feat: serp_feature_score(entry),
            est_clicks: 0.0,
            ..FeatureRow::default()
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relevance::FixedScorer;

    fn entry(rank: Option<u32>) -> ResultEntry {
        ResultEntry {
            rank,
            domain: "example.com".into(),
            title: "Example".into(),
            description: "Example description".into(),
            is_featured_snippet: false,
            in_people_also_ask: false,
        }
    }

    #[test]
    fn visibility_of_top_rank_is_one() {
        assert!((visibility(Some(1), 0.15) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn visibility_is_strictly_decreasing_in_rank() {
        let alpha = 0.15;
        let mut prev = visibility(Some(1), alpha);
        for rank in 2..30 {
            let v = visibility(Some(rank), alpha);
            assert!(v < prev, "vis({rank}) should be below vis({})", rank - 1);
            assert!(v > 0.0);
            prev = v;
        }
    }

    #[test]
    fn missing_rank_has_zero_visibility() {
        assert_eq!(visibility(None, 0.15), 0.0);
    }

    #[test]
    fn rank_zero_is_clamped_to_top() {
        assert!((visibility(Some(0), 0.15) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn feature_score_combines_and_clamps() {
        let mut e = entry(Some(1));
        assert_eq!(serp_feature_score(&e), 0.0);
        e.is_featured_snippet = true;
        assert!((serp_feature_score(&e) - 0.6).abs() < 1e-12);
        e.in_people_also_ask = true;
        assert!((serp_feature_score(&e) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_batch_is_a_validation_error() {
        let scorer = FixedScorer::uniform(0.5, 0);
        let err = extract_features(&[], "q", 0.15, &scorer).unwrap_err();
        assert!(matches!(err, EstimateError::Validation(_)));
    }

    #[test]
    fn all_missing_ranks_is_a_validation_error() {
        let batch = vec![entry(None), entry(None)];
        let scorer = FixedScorer::uniform(0.5, 2);
        let err = extract_features(&batch, "q", 0.15, &scorer).unwrap_err();
        assert!(matches!(err, EstimateError::Validation(_)));
    }

    #[test]
    fn some_missing_ranks_are_tolerated() {
        let batch = vec![entry(Some(1)), entry(None)];
        let scorer = FixedScorer::uniform(0.5, 2);
        let rows = extract_features(&batch, "q", 0.15, &scorer).unwrap();
        assert!((rows[0].vis - 1.0).abs() < 1e-12);
        assert_eq!(rows[1].vis, 0.0);
    }

    #[test]
    fn scorer_arity_breach_is_a_validation_error() {
        let batch = vec![entry(Some(1)), entry(Some(2))];
        let scorer = FixedScorer::new(vec![0.5]);
        let err = extract_features(&batch, "q", 0.15, &scorer).unwrap_err();
        assert!(matches!(err, EstimateError::Validation(_)));
    }

    #[test]
    fn placeholder_signals_stay_zero() {
        let batch = vec![entry(Some(1)), entry(Some(2)), entry(Some(3))];
        let scorer = FixedScorer::uniform(0.7, 3);
        let rows = extract_features(&batch, "q", 0.15, &scorer).unwrap();
        for row in &rows {
            assert_eq!(row.auth, 0.0);
            assert_eq!(row.est_clicks, 0.0);
            assert!((row.sem - 0.7).abs() < 1e-12);
        }
    }
}
