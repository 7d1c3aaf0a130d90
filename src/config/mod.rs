//! Configuration module for Sift.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ClaimPrompts, Prompts, SummaryPrompts, VerdictPrompts};
pub use settings::{
    mask_secret, FactCheckSettings, GeneralSettings, LlmSettings, PromptSettings,
    RetrievalSettings, SearchSettings, ServerSettings, Settings, LLM_API_KEY_ENV,
    LLM_API_KEY_FALLBACK_ENV, MODEL_ID_ENV, SEARCH_API_KEY_ENV,
};
