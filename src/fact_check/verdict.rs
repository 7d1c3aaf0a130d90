//! Parsing of verdict replies.

use crate::error::{Result, SiftError};
use crate::llm::extract_json;
use crate::search::SearchResult;
use serde::Deserialize;
use serde_json::Value;

/// Raw verdict object as returned by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictReply {
    pub verdict: String,
    #[serde(default)]
    pub confidence: Option<String>,
    /// 1-based indices into the search results.
    #[serde(default)]
    pub sources: Vec<Value>,
}

impl VerdictReply {
    /// Resolve cited indices to search results, in citation order.
    ///
    /// Indices may be numbers or numeric strings. Out-of-range and repeated
    /// indices are ignored.
    pub fn select_sources(&self, results: &[SearchResult]) -> Vec<SearchResult> {
        let mut picked: Vec<usize> = Vec::new();
        for value in &self.sources {
            let index = match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().trim_start_matches('[').trim_end_matches(']').parse().ok(),
                _ => None,
            };
            let Some(index) = index.and_then(|i| usize::try_from(i).ok()) else {
                continue;
            };
            if (1..=results.len()).contains(&index) && !picked.contains(&index) {
                picked.push(index);
            }
        }

        picked.into_iter().map(|i| results[i - 1].clone()).collect()
    }
}

/// Parse a verdict object out of a model reply.
pub fn parse_verdict(reply: &str) -> Result<VerdictReply> {
    let json = extract_json(reply, '{');
    serde_json::from_str(json)
        .map_err(|e| SiftError::Llm(format!("Verdict is not a valid JSON object: {}", e)))
}
