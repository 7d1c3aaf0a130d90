//! Configuration settings for Sift.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the LLM provider key.
pub const LLM_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Fallback environment variable for OpenAI-compatible providers.
pub const LLM_API_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the search provider key.
pub const SEARCH_API_KEY_ENV: &str = "SERPER_API_KEY";
/// Environment variable overriding the model identifier.
pub const MODEL_ID_ENV: &str = "MODEL_ID";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub retrieval: RetrievalSettings,
    pub fact_check: FactCheckSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// LLM provider settings (any OpenAI-compatible chat completions API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the chat completions API.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
    /// API key. Usually supplied through `OPENROUTER_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum characters of retrieved content embedded in a prompt.
    pub max_input_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            api_key: None,
            temperature: 0.2,
            timeout_seconds: 120,
            max_input_chars: 24_000,
        }
    }
}

/// Web search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Serper search endpoint.
    pub endpoint: String,
    /// API key. Usually supplied through `SERPER_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Country code passed to the provider (`gl`).
    pub country: String,
    /// Number of results requested per query.
    pub num_results: u32,
    /// Suffix appended to every claim when searching.
    pub query_suffix: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://google.serper.dev/search".to_string(),
            api_key: None,
            country: "us".to_string(),
            num_results: 8,
            query_suffix: " fact check".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Content retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum characters kept from a web page.
    pub max_page_chars: usize,
    /// User-Agent sent when fetching pages and transcripts.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Prefix transcript lines with `[mm:ss]` markers.
    pub include_timestamps: bool,
    /// Preferred transcript language.
    pub preferred_language: String,
    /// Maximum characters kept from a video description.
    pub description_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_page_chars: 10_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout_seconds: 30,
            include_timestamps: true,
            preferred_language: "en".to_string(),
            description_chars: 500,
        }
    }
}

/// Fact-checking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactCheckSettings {
    /// Maximum number of claims verified per request.
    pub max_claims: usize,
}

impl Default for FactCheckSettings {
    fn default() -> Self {
        Self { max_claims: 5 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load variables from a `.env` file into the process environment.
    ///
    /// Reads `path` when given, otherwise searches the current directory and
    /// its parents. Variables already set in the environment are kept.
    /// Returns the file that was loaded, if any.
    pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => dotenv::from_path(p).ok().map(|_| p.to_path_buf()),
            None => dotenv::dotenv().ok(),
        }
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Non-empty environment values win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(LLM_API_KEY_ENV).or_else(|| non_empty(LLM_API_KEY_FALLBACK_ENV)) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = non_empty(SEARCH_API_KEY_ENV) {
            self.search.api_key = Some(key);
        }
        if let Some(model) = non_empty(MODEL_ID_ENV) {
            self.llm.model = model;
        }
    }

    /// The LLM key, or a configuration error naming the variable to set.
    pub fn require_llm_key(&self) -> crate::error::Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing_key(LLM_API_KEY_ENV))
    }

    /// The search key, or a configuration error naming the variable to set.
    pub fn require_search_key(&self) -> crate::error::Result<&str> {
        self.search
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing_key(SEARCH_API_KEY_ENV))
    }

    /// A copy with API keys masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.api_key = copy.llm.api_key.as_deref().map(mask_secret);
        copy.search.api_key = copy.search.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Save settings to a specific path. API keys are never written.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut to_write = self.clone();
        to_write.llm.api_key = None;
        to_write.search.api_key = None;
        let content = toml::to_string_pretty(&to_write)
            .map_err(|e| crate::error::SiftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sift")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

fn missing_key(var: &str) -> crate::error::SiftError {
    crate::error::SiftError::Config(format!(
        "{} not found in environment variables. Please set it in your shell or the config file.",
        var
    ))
}

/// Mask a secret, keeping a short prefix and suffix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
