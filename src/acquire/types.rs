// src/acquire/types.rs
//! Source descriptors and batch types shared by the acquisition layer.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;

/// Named data sources fetched for one keyword + domain pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Ranked organic results. Mandatory for any downstream scoring.
    SerpOrganic,
    /// AI keyword search volume. Best-effort.
    AiKeywordVolume,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::SerpOrganic => "serp_google_organic_live_advanced",
            SourceKind::AiKeywordVolume => "ai_keyword_search_volume",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            SourceKind::SerpOrganic => "serp/google/organic/live/advanced",
            SourceKind::AiKeywordVolume => {
                "ai_optimization/ai_keyword_data/keywords_search_volume/live"
            }
        }
    }

    /// The ranking source is required; everything else degrades gracefully.
    pub fn is_required(&self) -> bool {
        matches!(self, SourceKind::SerpOrganic)
    }
}

/// One request against a named source.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub kind: SourceKind,
    pub payload: serde_json::Value,
}

impl SourceRequest {
    /// Organic SERP scan: US desktop, English, first 30 results.
    pub fn serp(keyword: &str) -> Self {
        Self {
            kind: SourceKind::SerpOrganic,
            payload: json!([{
                "keyword": keyword,
                "location_code": 2840,
                "language_code": "en",
                "device": "desktop",
                "os": "macos",
                "depth": 30,
            }]),
        }
    }

    /// AI keyword search volume for one keyword, US/English.
    pub fn ai_volume(keyword: &str) -> Self {
        Self {
            kind: SourceKind::AiKeywordVolume,
            payload: json!([{
                "language_name": "English",
                "location_code": 2840,
                "keywords": [keyword],
            }]),
        }
    }
}

/// Raw task payloads collected for one keyword + domain fetch, keyed by
/// source name. `None` records an optional source that failed after retries.
#[derive(Debug, Clone)]
pub struct KeywordBatch {
    pub keyword: String,
    pub domain: String,
    pub sources: BTreeMap<&'static str, Option<serde_json::Value>>,
    pub fetched_at: DateTime<Utc>,
}

impl KeywordBatch {
    pub fn source(&self, kind: SourceKind) -> Option<&serde_json::Value> {
        self.sources.get(kind.name()).and_then(|v| v.as_ref())
    }

    /// Raw ranked-results payload. Present on every successfully fetched batch.
    pub fn serp(&self) -> Option<&serde_json::Value> {
        self.source(SourceKind::SerpOrganic)
    }

    /// Raw keyword-volume payload, when the optional source succeeded.
    pub fn ai_volume(&self) -> Option<&serde_json::Value> {
        self.source(SourceKind::AiKeywordVolume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_ranking_source_is_required() {
        assert!(SourceKind::SerpOrganic.is_required());
        assert!(!SourceKind::AiKeywordVolume.is_required());
    }

    #[test]
    fn serp_payload_carries_the_keyword() {
        let req = SourceRequest::serp("faceless video ai");
        assert_eq!(req.kind, SourceKind::SerpOrganic);
        assert_eq!(req.payload[0]["keyword"], "faceless video ai");
        assert_eq!(req.payload[0]["depth"], 30);
    }

    #[test]
    fn volume_payload_wraps_the_keyword_list() {
        let req = SourceRequest::ai_volume("faceless video ai");
        assert_eq!(req.payload[0]["keywords"][0], "faceless video ai");
    }

    #[test]
    fn batch_lookup_is_keyed_by_source_name() {
        let mut sources = BTreeMap::new();
        sources.insert(
            SourceKind::SerpOrganic.name(),
            Some(serde_json::json!({"tasks": []})),
        );
        sources.insert(SourceKind::AiKeywordVolume.name(), None);
        let batch = KeywordBatch {
            keyword: "k".into(),
            domain: "d.com".into(),
            sources,
            fetched_at: Utc::now(),
        };
        assert!(batch.serp().is_some());
        assert!(batch.ai_volume().is_none());
    }
}
