//! Web search used to gather evidence for claims.

mod serper;

pub use serper::SerperSearcher;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }
}

/// Trait for web search providers.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Run a query. Results keep the provider's ranking.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Format results as a numbered list for prompts (numbering starts at 1).
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(no results)".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}\nURL: {}\n{}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}
