//! Error types for Sift.

use thiserror::Error;

/// Library-level error type for Sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Search provider error: {0}")]
    SearchProvider(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;
