// src/relevance.rs
//! Text relevance scoring seam.
//!
//! The estimator only depends on [`SimilarityScorer`]; the lexical TF-IDF
//! implementation below is the default, and embedding-based scorers can be
//! substituted without touching the engine.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;

/// Maps one query against a batch of candidate texts.
///
/// Implementations must be length-preserving: one similarity in `[0, 1]` per
/// candidate, in candidate order. Called once per batch.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, query: &str, candidates: &[String]) -> Vec<f64>;

    /// Implementation name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Basic, Unicode-friendly tokenizer: lowercased `\w+` runs.
fn tokenize(input: &str) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?u)\b\w+\b").expect("tokenizer regex"));
    re.find_iter(&input.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lexical TF-IDF scorer with smoothed IDF and cosine similarity.
///
/// The vocabulary and document frequencies are computed over the query plus
/// the current candidate batch only; nothing is fitted or kept across calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityScorer for TfIdfScorer {
    fn score(&self, query: &str, candidates: &[String]) -> Vec<f64> {
        let mut docs: Vec<Vec<String>> = Vec::with_capacity(candidates.len() + 1);
        docs.push(tokenize(query));
        docs.extend(candidates.iter().map(|c| tokenize(c)));

        // Vocabulary and document frequencies over this batch only.
        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        for doc in &docs {
            let mut seen: Vec<usize> = Vec::new();
            for term in doc {
                let idx = match vocab.get(term) {
                    Some(&i) => i,
                    None => {
                        let i = vocab.len();
                        vocab.insert(term.clone(), i);
                        df.push(0);
                        i
                    }
                };
                if !seen.contains(&idx) {
                    seen.push(idx);
                    df[idx] += 1;
                }
            }
        }

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1.
        let n = docs.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let vectors: Vec<Vec<f64>> = docs
            .iter()
            .map(|doc| {
                let mut v = vec![0.0; vocab.len()];
                for term in doc {
                    if let Some(&idx) = vocab.get(term) {
                        v[idx] += 1.0;
                    }
                }
                for (i, x) in v.iter_mut().enumerate() {
                    *x *= idf[i];
                }
                l2_normalize(&mut v);
                v
            })
            .collect();

        let query_vec = &vectors[0];
        vectors[1..]
            .iter()
            .map(|cand| dot(query_vec, cand).clamp(0.0, 1.0))
            .collect()
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

fn l2_normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Test scorer returning pre-set similarity values.
#[derive(Debug, Clone)]
pub struct FixedScorer {
    pub values: Vec<f64>,
}

impl FixedScorer {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Same similarity for `len` candidates.
    pub fn uniform(value: f64, len: usize) -> Self {
        Self {
            values: vec![value; len],
        }
    }
}

impl SimilarityScorer for FixedScorer {
    fn score(&self, _query: &str, _candidates: &[String]) -> Vec<f64> {
        self.values.clone()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
