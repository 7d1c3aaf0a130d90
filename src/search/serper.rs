//! Serper (Google search API) provider.

use super::{SearchResult, WebSearcher};
use crate::config::{SearchSettings, SEARCH_API_KEY_ENV};
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    gl: &'a str,
    num: u32,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Web searcher backed by the Serper API.
pub struct SerperSearcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    country: String,
    num_results: u32,
}

impl SerperSearcher {
    /// Create a searcher. Fails if no API key is configured.
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                SiftError::Config(format!(
                    "Search API key not set. Set {} to enable fact-checking.",
                    SEARCH_API_KEY_ENV
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| SiftError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
            country: settings.country.clone(),
            num_results: settings.num_results,
        })
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query,
                gl: &self.country,
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| SiftError::SearchProvider(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SiftError::SearchProvider(format!(
                "Search provider returned HTTP {}: {}",
                status,
                crate::llm::truncate_chars(body.trim(), 200).0
            )));
        }

        let payload: SerperResponse = response.json().await.map_err(|e| {
            SiftError::SearchProvider(format!("Malformed search response: {}", e))
        })?;

        let results: Vec<SearchResult> = payload
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| SearchResult {
                title: r.title,
                snippet: r.snippet,
                url: r.link,
            })
            .collect();

        debug!("Search returned {} results", results.len());
        Ok(results)
    }
}
