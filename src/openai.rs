//! OpenAI-compatible client configuration.
//!
//! The default provider is OpenRouter, which speaks the OpenAI chat completions API.

use crate::config::LlmSettings;
use crate::error::{Result, SiftError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured provider.
///
/// Fails with a configuration error when no API key is available.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            SiftError::Config(format!(
                "{} not found in environment variables. Please set it in your shell or the config file.",
                crate::config::LLM_API_KEY_ENV
            ))
        })?;

    create_client_with_timeout(
        &settings.api_base,
        api_key,
        Duration::from_secs(settings.timeout_seconds),
    )
}

/// Create a client with an explicit base URL, key and timeout.
pub fn create_client_with_timeout(
    api_base: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SiftError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
