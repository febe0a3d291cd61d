// src/acquire/transport.rs
//! HTTP transport seam plus the per-source retry loop.
//!
//! Each attempt is classified into an explicit [`AttemptOutcome`] value and
//! consumed by a small loop: `Attempting → (Success | BackoffWait →
//! Attempting | Exhausted)`. No error unwinding signals "retry".

use crate::acquire::types::SourceKind;
use crate::error::SourceError;
use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Provider base URL for the live transport.
pub const DEFAULT_BASE_URL: &str = "https://api.dataforseo.com/v3";

/// Transport-level failure: connect error, timeout, body read failure.
/// Always eligible for retry.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Raw response captured from the transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// POSTs one JSON payload to a provider endpoint. Tests substitute scripted
/// transports for the live `reqwest`-backed one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError>;
}

/// Live transport backed by `reqwest`, with Basic auth and a fixed timeout.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl HttpTransport {
    /// `token` is the provider credential, already base64-encoded.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent("serp-share-estimator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Basic {}", self.auth_token))
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Outcome of one attempt against one source.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(serde_json::Value),
    Retryable(String),
    Fatal { status: u16, message: String },
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Classify a transport result. Rate-limited and server-side-unavailable
/// statuses are retryable; every other non-success status is fatal.
pub fn classify_response(
    result: Result<TransportResponse, TransportError>,
) -> AttemptOutcome {
    match result {
        Err(e) => AttemptOutcome::Retryable(e.to_string()),
        Ok(resp) if resp.status == 200 => match serde_json::from_str(&resp.body) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(e) => AttemptOutcome::Retryable(format!("malformed response body: {e}")),
        },
        Ok(resp) if is_retryable_status(resp.status) => {
            AttemptOutcome::Retryable(format!("status {}", resp.status))
        }
        Ok(resp) => AttemptOutcome::Fatal {
            status: resp.status,
            message: truncate_body(&resp.body),
        },
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        body.chars().take(MAX).collect()
    }
}

/// Attempt budget and backoff base for one source's retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff after the (attempt+1)-th failure: base, 2·base, 4·base, …
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(failed_attempts.saturating_sub(1))
    }
}

/// Fetch one source with sequential retries and exponential backoff.
///
/// Backoff sleeps happen before the second and later attempts only; a fatal
/// response ends the loop immediately.
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    kind: SourceKind,
    payload: &serde_json::Value,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, SourceError> {
    let mut last_failure = String::new();

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            let delay = policy.backoff(attempt - 1);
            debug!(
                source = kind.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "backing off before retry"
            );
            tokio::time::sleep(delay).await;
        }

        counter!("acquire_requests_total").increment(1);
        match classify_response(transport.post(kind.endpoint(), payload).await) {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Retryable(message) => {
                counter!("acquire_transient_failures_total").increment(1);
                warn!(
                    source = kind.name(),
                    attempt,
                    error = %message,
                    "transient source failure"
                );
                last_failure = message;
            }
            AttemptOutcome::Fatal { status, message } => {
                return Err(SourceError::Fatal {
                    source: kind.name(),
                    status,
                    message,
                });
            }
        }
    }

    Err(SourceError::Transient {
        source: kind.name(),
        attempts: policy.max_attempts,
        message: last_failure,
    })
}
