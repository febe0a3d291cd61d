// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod acquire;
pub mod error;
pub mod estimator;
pub mod relevance;
pub mod serp;

// ---- Re-exports for stable public API ----
pub use crate::acquire::{AcquireConfig, HttpTransport, SourceClient, SourceKind, Transport};
pub use crate::error::{AcquireError, EstimateError, SourceError};
pub use crate::estimator::{
    apportion, estimate_shares, EstimatorConfig, FeatureRow, ScoredEntry, ShareWeights,
};
pub use crate::relevance::{FixedScorer, SimilarityScorer, TfIdfScorer};
pub use crate::serp::{parse_ai_volume, parse_serp_entries, ResultEntry};

use anyhow::Context;
use tracing::info;

/// Fetch, parse, and score one keyword + domain pair end to end.
///
/// The ranking source must be present (acquisition guarantees this for a
/// successful batch); the keyword-volume source is best-effort and, when
/// absent, the scored entries carry shares but no apportioned volume.
pub async fn estimate_keyword<T: Transport>(
    client: &SourceClient<T>,
    keyword: &str,
    domain: &str,
    config: &EstimatorConfig,
    scorer: &dyn SimilarityScorer,
) -> anyhow::Result<Vec<ScoredEntry>> {
    let batch = client.fetch_keyword_analysis(keyword, domain).await?;

    let serp_raw = batch
        .serp()
        .context("ranking source missing from fetched batch")?;
    let entries = serp::parse_serp_entries(serp_raw);

    let mut scored = estimator::estimate_shares(&entries, keyword, config, scorer)?;

    if let Some((_, volume)) = batch.ai_volume().and_then(parse_ai_volume) {
        estimator::apportion(&mut scored, volume);
    }

    info!(
        keyword,
        domain,
        entries = scored.len(),
        has_volume = scored.first().is_some_and(|s| s.ai_potential_volume.is_some()),
        "keyword estimate complete"
    );
    Ok(scored)
}
