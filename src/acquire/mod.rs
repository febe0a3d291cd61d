// src/acquire/mod.rs
//! Bounded-concurrency acquisition of per-source task data.
//!
//! Sources are fetched independently behind a shared permit pool; a failure
//! on one source never aborts its siblings. An optional source that fails
//! after retries is recorded as absent, while a required-source failure drops
//! the whole batch.

pub mod transport;
pub mod types;

use crate::error::{AcquireError, SourceError};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, warn};

pub use transport::{
    classify_response, fetch_with_retry, AttemptOutcome, HttpTransport, RetryPolicy, Transport,
    TransportError, TransportResponse,
};
pub use types::{KeywordBatch, SourceKind, SourceRequest};

/// One-time metrics registration (so series show up on the exporter side).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "acquire_requests_total",
            "Attempts sent to the data provider."
        );
        describe_counter!(
            "acquire_transient_failures_total",
            "Retryable transport/status failures observed."
        );
        describe_counter!(
            "acquire_source_errors_total",
            "Sources that failed after the retry budget."
        );
        describe_histogram!(
            "acquire_fetch_ms",
            "Wall time of one multi-source fetch in milliseconds."
        );
        describe_gauge!(
            "acquire_last_fetch_ts",
            "Unix ts when the last fetch completed."
        );
        describe_counter!(
            "serp_entries_total",
            "Organic entries parsed from task envelopes."
        );
        describe_histogram!("serp_parse_ms", "Envelope parse time in milliseconds.");
    });
}

/// Acquisition tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct AcquireConfig {
    /// Permits for in-flight provider requests.
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Client for the fixed set of named data sources.
pub struct SourceClient<T: Transport> {
    transport: T,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl SourceClient<HttpTransport> {
    /// Live client with the default base URL. `token` is the provider
    /// credential, already base64-encoded.
    pub fn connect(token: impl Into<String>, config: AcquireConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(token, config.timeout)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> SourceClient<T> {
    pub fn new(transport: T, config: AcquireConfig) -> Self {
        Self {
            transport,
            permits: Arc::new(Semaphore::new(config.max_concurrency)),
            retry: config.retry,
        }
    }

    /// Borrow the underlying transport. Public for tests/tools.
    pub fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Fetch one source behind a concurrency permit. Retries within this call
    /// are sequential; the permit is held across them.
    async fn fetch_source(&self, request: &SourceRequest) -> Result<serde_json::Value, SourceError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("semaphore never closed");
        fetch_with_retry(&self.transport, request.kind, &request.payload, &self.retry).await
    }

    /// Fetch every request independently. Each failed source records `None`
    /// in the map; the failures are returned alongside for the caller's
    /// policy to act on. Results are keyed by source name, not completion
    /// order.
    pub async fn fetch_sources(
        &self,
        requests: &[SourceRequest],
    ) -> (
        BTreeMap<&'static str, Option<serde_json::Value>>,
        Vec<SourceError>,
    ) {
        ensure_metrics_described();

        let outcomes = futures::future::join_all(
            requests
                .iter()
                .map(|r| async move { (r.kind, self.fetch_source(r).await) }),
        )
        .await;

        let mut sources = BTreeMap::new();
        let mut errors = Vec::new();
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(value) => {
                    sources.insert(kind.name(), Some(value));
                }
                Err(e) => {
                    counter!("acquire_source_errors_total").increment(1);
                    warn!(source = kind.name(), error = %e, "source failed");
                    sources.insert(kind.name(), None);
                    errors.push(e);
                }
            }
        }
        (sources, errors)
    }

    /// Fetch the fixed keyword-analysis source set for one keyword + domain
    /// pair. The ranking source is required: if it failed, the whole fetch
    /// fails after every source was attempted and any sibling data is
    /// discarded with it.
    pub async fn fetch_keyword_analysis(
        &self,
        keyword: &str,
        domain: &str,
    ) -> Result<KeywordBatch, AcquireError> {
        let t0 = std::time::Instant::now();
        let requests = vec![
            SourceRequest::serp(keyword),
            SourceRequest::ai_volume(keyword),
        ];
        let (sources, mut errors) = self.fetch_sources(&requests).await;

        let required_failure = errors.iter().position(|e| {
            requests
                .iter()
                .any(|r| r.kind.is_required() && r.kind.name() == e.source_name())
        });
        if let Some(pos) = required_failure {
            let cause = errors.swap_remove(pos);
            error!(
                keyword,
                domain,
                source = cause.source_name(),
                "required source failed, discarding partial batch"
            );
            return Err(AcquireError::RequiredSourceFailed {
                source: cause.source_name(),
                cause,
            });
        }

        let now = Utc::now();
        histogram!("acquire_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("acquire_last_fetch_ts").set(now.timestamp() as f64);

        Ok(KeywordBatch {
            keyword: keyword.to_string(),
            domain: domain.to_string(),
            sources,
            fetched_at: now,
        })
    }
}
