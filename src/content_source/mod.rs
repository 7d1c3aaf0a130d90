//! Content retrieval for Sift.
//!
//! Turns a URL into normalized text. Sources are tried in order (YouTube
//! first, then generic web pages); the first one that recognizes the input
//! fetches it.

mod html;
mod web;
mod youtube;

pub use html::{html_to_markdown, PageText};
pub use web::WebPageSource;
pub use youtube::{CaptionTrack, VideoMetadata, YoutubeSource};

use crate::config::RetrievalSettings;
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Marker appended to content cut at the character budget.
pub const TRUNCATION_MARKER: &str = "[content truncated]";

/// Kind of retrieved content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    YouTube,
    WebPage,
}

impl ContentKind {
    /// Human description used in prompts.
    pub fn describe(&self) -> &'static str {
        match self {
            ContentKind::YouTube => "YouTube video transcript",
            ContentKind::WebPage => "web article",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::YouTube => write!(f, "youtube"),
            ContentKind::WebPage => write!(f, "webpage"),
        }
    }
}

/// Normalized content produced by a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContent {
    /// Kind of source.
    pub kind: ContentKind,
    /// The URL that was fetched.
    pub url: String,
    /// Title (if known).
    pub title: Option<String>,
    /// Transcript or page text.
    pub text: String,
    /// Optional descriptive fields, in display order.
    pub metadata: Vec<(String, String)>,
    /// Whether `text` was cut at the character budget.
    pub truncated: bool,
}

impl RetrievedContent {
    /// Look up a metadata field.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render metadata and text as a single document for prompts.
    pub fn to_prompt_text(&self) -> String {
        let mut output = String::new();

        let heading = match self.kind {
            ContentKind::YouTube => "Video Information",
            ContentKind::WebPage => "Article Information",
        };
        output.push_str(&format!("# {}\n", heading));
        output.push_str(&format!("URL: {}\n", self.url));

        let mut description = None;
        for (key, value) in &self.metadata {
            if key == "description" {
                description = Some(value);
                continue;
            }
            output.push_str(&format!("{}: {}\n", metadata_label(key), value));
        }

        if let Some(description) = description {
            output.push_str("\n## Description\n");
            output.push_str(description);
            output.push('\n');
        }

        let body_heading = match self.kind {
            ContentKind::YouTube => "Transcript",
            ContentKind::WebPage => "Content",
        };
        output.push_str(&format!("\n## {}\n", body_heading));
        output.push_str(&self.text);
        output
    }
}

fn metadata_label(key: &str) -> String {
    match key {
        "duration_seconds" => "Duration (seconds)".to_string(),
        "view_count" => "Views".to_string(),
        "like_count" => "Likes".to_string(),
        "upload_date" => "Upload Date".to_string(),
        other => {
            let mut chars = other.replace('_', " ").chars().collect::<Vec<_>>();
            if let Some(first) = chars.first_mut() {
                *first = first.to_ascii_uppercase();
            }
            chars.into_iter().collect()
        }
    }
}

/// Trait for content source providers.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Kind of content this source produces.
    fn kind(&self) -> ContentKind;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Fetch and normalize the content behind the input.
    async fn fetch(&self, input: &str) -> Result<RetrievedContent>;
}

/// Classifies a URL and dispatches it to the matching source.
pub struct Retriever {
    sources: Vec<Arc<dyn ContentSource>>,
}

impl Retriever {
    /// Create a retriever with the YouTube and web page sources.
    pub fn new(settings: &RetrievalSettings) -> Result<Self> {
        let client = build_http_client(settings)?;

        Ok(Self::with_sources(vec![
            Arc::new(YoutubeSource::new(client.clone(), settings)),
            Arc::new(WebPageSource::new(client, settings.max_page_chars)),
        ]))
    }

    /// Create a retriever with custom sources, tried in order.
    pub fn with_sources(sources: Vec<Arc<dyn ContentSource>>) -> Self {
        Self { sources }
    }

    /// Detect the source for the given input.
    pub fn detect(&self, input: &str) -> Option<&Arc<dyn ContentSource>> {
        self.sources.iter().find(|s| s.can_handle(input))
    }

    /// Classify the input without fetching it.
    pub fn classify(&self, input: &str) -> Result<ContentKind> {
        self.detect(input.trim())
            .map(|s| s.kind())
            .ok_or_else(|| unsupported(input))
    }

    /// Retrieve normalized content for a URL.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn retrieve(&self, input: &str) -> Result<RetrievedContent> {
        let input = input.trim();
        let source = self.detect(input).ok_or_else(|| unsupported(input))?;

        info!("Retrieving {} content", source.kind());
        let content = source.fetch(input).await?;

        if content.text.trim().is_empty() {
            return Err(SiftError::Fetch(format!(
                "No readable content found at {}",
                input
            )));
        }

        info!(
            "Retrieved {} characters{}",
            content.text.chars().count(),
            if content.truncated { " (truncated)" } else { "" }
        );
        Ok(content)
    }
}

fn unsupported(input: &str) -> SiftError {
    SiftError::UnsupportedSource(format!(
        "'{}' is neither a YouTube video nor an http(s) web page",
        input
    ))
}

/// Build the HTTP client shared by all sources.
pub fn build_http_client(settings: &RetrievalSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|e| SiftError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Cut text to `max_chars` characters, appending the truncation marker when cut.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> (String, bool) {
    let (kept, truncated) = crate::llm::truncate_chars(text, max_chars);
    if truncated {
        (
            format!("{}\n\n{}", kept.trim_end(), TRUNCATION_MARKER),
            true,
        )
    } else {
        (kept.to_string(), false)
    }
}
