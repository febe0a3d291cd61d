// src/serp.rs
//! Task-envelope parsing: provider responses → ranked [`ResultEntry`] batches.
//!
//! Only items tagged `organic` become entries; `people_also_ask` items
//! contribute their nested domain list to the `in_people_also_ask` flag, and
//! every other item type is ignored. A task whose `status_code` is not the
//! success sentinel yields zero entries and a warning, never an abort.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Success sentinel carried inside task envelopes.
pub const TASK_STATUS_OK: u32 = 20000;

/// One ranked search result. Immutable once parsed; owned by the run that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Absolute rank, 1 = top. `None` when the provider omitted it.
    pub rank: Option<u32>,
    pub domain: String,
    pub title: String,
    pub description: String,
    pub is_featured_snippet: bool,
    pub in_people_also_ask: bool,
}

impl ResultEntry {
    /// Concatenated title + description used for semantic scoring.
    pub fn semantic_text(&self) -> String {
        format!("{} {}", self.title, self.description)
            .trim()
            .to_string()
    }
}

// ---- Envelope shapes ----

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de>"))]
pub struct ApiResponse<I> {
    #[serde(default)]
    pub tasks: Vec<TaskEnvelope<I>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de>"))]
pub struct TaskEnvelope<I> {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    /// `null` on failed tasks.
    #[serde(default)]
    pub result: Option<Vec<TaskPage<I>>>,
}

impl<I> TaskEnvelope<I> {
    pub fn is_ok(&self) -> bool {
        self.status_code == TASK_STATUS_OK
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de>"))]
pub struct TaskPage<I> {
    #[serde(default)]
    pub items: Option<Vec<I>>,
}

/// SERP page items, discriminated by the provider's `type` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerpItem {
    Organic {
        #[serde(default)]
        rank_absolute: Option<u32>,
        #[serde(default)]
        domain: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        is_featured_snippet: Option<bool>,
    },
    PeopleAlsoAsk {
        #[serde(default)]
        items: Option<Vec<PaaQuestion>>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaaQuestion {
    #[serde(default)]
    pub expanded_element: Option<Vec<PaaExpanded>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaaExpanded {
    #[serde(default)]
    pub domain: Option<String>,
}

/// Keyword-volume items.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeItem {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub ai_search_volume: Option<f64>,
}

// ---- Parsing ----

/// Parse a raw SERP task response into ranked entries.
///
/// Organic items are collected in envelope order; afterwards every entry whose
/// domain appeared inside a people-also-ask expansion gets its flag set.
pub fn parse_serp_entries(raw: &serde_json::Value) -> Vec<ResultEntry> {
    let t0 = std::time::Instant::now();

    let response: ApiResponse<SerpItem> = match serde_json::from_value(raw.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "unparseable SERP response envelope");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    let mut paa_domains: HashSet<String> = HashSet::new();

    for task in &response.tasks {
        if !task.is_ok() {
            warn!(
                status_code = task.status_code,
                status_message = %task.status_message,
                "SERP task failed"
            );
            continue;
        }
        for page in task.result.iter().flatten() {
            for item in page.items.iter().flatten() {
                match item {
                    SerpItem::Organic {
                        rank_absolute,
                        domain,
                        title,
                        description,
                        is_featured_snippet,
                    } => {
                        entries.push(ResultEntry {
                            rank: *rank_absolute,
                            domain: domain.clone().unwrap_or_default(),
                            title: normalize_text(title.as_deref().unwrap_or_default()),
                            description: normalize_text(
                                description.as_deref().unwrap_or_default(),
                            ),
                            is_featured_snippet: is_featured_snippet.unwrap_or(false),
                            in_people_also_ask: false,
                        });
                    }
                    SerpItem::PeopleAlsoAsk { items } => {
                        for question in items.iter().flatten() {
                            for expanded in question.expanded_element.iter().flatten() {
                                if let Some(d) = &expanded.domain {
                                    paa_domains.insert(d.clone());
                                }
                            }
                        }
                    }
                    SerpItem::Other => {}
                }
            }
        }
    }

    for entry in &mut entries {
        entry.in_people_also_ask = paa_domains.contains(&entry.domain);
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("serp_parse_ms").record(ms);
    counter!("serp_entries_total").increment(entries.len() as u64);
    entries
}

/// Parse a keyword-volume task response; first `(keyword, volume)` item wins.
pub fn parse_ai_volume(raw: &serde_json::Value) -> Option<(String, f64)> {
    let response: ApiResponse<VolumeItem> = match serde_json::from_value(raw.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "unparseable keyword-volume response envelope");
            return None;
        }
    };

    for task in &response.tasks {
        if !task.is_ok() {
            warn!(
                status_code = task.status_code,
                status_message = %task.status_message,
                "keyword-volume task failed"
            );
            continue;
        }
        for page in task.result.iter().flatten() {
            for item in page.items.iter().flatten() {
                if let (Some(keyword), Some(volume)) = (&item.keyword, item.ai_search_volume) {
                    return Some((keyword.clone(), volume));
                }
            }
        }
    }
    None
}

/// Normalize provider text: entity decode, tag strip, quote normalization,
/// whitespace collapse.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize typographic quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}
