// src/estimator/mod.rs
//! Domain share estimation pipeline: features → scaling → logits → softmax.
//!
//! Every stage is a pure, synchronous function over the current batch. The
//! scaler's min/max and the softmax denominator are local to one call, so
//! concurrent runs never share state and re-running the same batch with the
//! same configuration reproduces the same scores.

pub mod features;
pub mod logit;
pub mod scaling;
pub mod share;
pub mod weights;

use crate::error::EstimateError;
use crate::relevance::SimilarityScorer;
use crate::serp::ResultEntry;
use serde::Serialize;
use tracing::debug;

// Re-export convenient types.
pub use features::{extract_features, visibility, FeatureRow};
pub use share::{apportion_volume, softmax_shares, SOFTMAX_EPSILON};
pub use weights::{load_config_default, load_config_from, EstimatorConfig, ShareWeights};

/// One fully scored entry: the input entry augmented with its signal row,
/// logit, share, and (when requested) the apportioned volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntry {
    pub entry: ResultEntry,
    pub features: FeatureRow,
    pub logit: f64,
    pub share: f64,
    pub ai_potential_volume: Option<f64>,
}

/// Run the full pipeline over one batch.
///
/// Input order is preserved; the output is the input sequence augmented with
/// features, logits, and shares.
pub fn estimate_shares(
    entries: &[ResultEntry],
    query: &str,
    config: &EstimatorConfig,
    scorer: &dyn SimilarityScorer,
) -> Result<Vec<ScoredEntry>, EstimateError> {
    config.validate()?;

    let mut rows = features::extract_features(entries, query, config.alpha, scorer)?;
    scaling::scale_rows(&mut rows);
    let logits = logit::combine_all(&rows, &config.weights);
    let shares = share::softmax_shares(&logits);

    debug!(
        entries = entries.len(),
        query,
        scorer = scorer.name(),
        "estimated domain shares"
    );

    Ok(entries
        .iter()
        .zip(rows)
        .zip(logits.iter().zip(shares))
        .map(|((entry, features), (logit, share))| ScoredEntry {
            entry: entry.clone(),
            features,
            logit: *logit,
            share,
            ai_potential_volume: None,
        })
        .collect())
}

/// Apportion an external total volume across already-scored entries.
pub fn apportion(scored: &mut [ScoredEntry], total_volume: f64) {
    for s in scored.iter_mut() {
        s.ai_potential_volume = Some(s.share * total_volume);
    }
}
