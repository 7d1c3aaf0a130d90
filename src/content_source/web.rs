//! Generic web page source.

use super::{html_to_markdown, truncate_with_marker, ContentKind, ContentSource, RetrievedContent};
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

/// Fetches an http(s) page and converts its body to markdown.
pub struct WebPageSource {
    client: reqwest::Client,
    max_chars: usize,
}

impl WebPageSource {
    pub fn new(client: reqwest::Client, max_chars: usize) -> Self {
        Self { client, max_chars }
    }

    fn parse_url(input: &str) -> Option<Url> {
        let url = Url::parse(input.trim()).ok()?;
        let web = matches!(url.scheme(), "http" | "https");
        (web && url.host_str().is_some_and(|h| !h.is_empty())).then_some(url)
    }
}

#[async_trait]
impl ContentSource for WebPageSource {
    fn kind(&self) -> ContentKind {
        ContentKind::WebPage
    }

    fn can_handle(&self, input: &str) -> bool {
        Self::parse_url(input).is_some()
    }

    async fn fetch(&self, input: &str) -> Result<RetrievedContent> {
        let url = Self::parse_url(input)
            .ok_or_else(|| SiftError::UnsupportedSource(format!("Not a web URL: {}", input)))?;

        info!("Fetching web page: {}", url);
        let response = self
            .client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml,text/plain")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SiftError::Fetch(format!("Request to {} timed out", url))
                } else {
                    SiftError::Fetch(format!("Failed to fetch {}: {}", url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiftError::Fetch(format!("HTTP {} from {}", status, url)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        let is_html = content_type.contains("text/html") || content_type.contains("xhtml");
        let is_plain = content_type.contains("text/plain");
        if !is_html && !is_plain {
            return Err(SiftError::UnsupportedSource(format!(
                "Unsupported content type '{}' at {}",
                content_type, url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SiftError::Fetch(format!("Failed to read body from {}: {}", url, e)))?;
        debug!("Downloaded {} bytes ({})", body.len(), content_type);

        let (title, text) = if is_html {
            let page = html_to_markdown(&body);
            (page.title, page.markdown)
        } else {
            (None, body.trim().to_string())
        };

        if text.trim().is_empty() {
            return Err(SiftError::Fetch(format!(
                "No readable text found at {}",
                url
            )));
        }

        let (text, truncated) = truncate_with_marker(&text, self.max_chars);

        let mut metadata = Vec::new();
        if let Some(title) = &title {
            metadata.push(("title".to_string(), title.clone()));
        }
        if let Some(host) = url.host_str() {
            metadata.push(("site".to_string(), host.to_string()));
        }

        Ok(RetrievedContent {
            kind: ContentKind::WebPage,
            url: url.to_string(),
            title,
            text,
            metadata,
            truncated,
        })
    }
}
