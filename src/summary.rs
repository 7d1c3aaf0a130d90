//! Bullet-point summarization.

use crate::config::Prompts;
use crate::content_source::RetrievedContent;
use crate::error::{Result, SiftError};
use crate::llm::{truncate_chars, ChatModel};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Minimum number of bullets a summary must have.
pub const MIN_BULLETS: usize = 3;
/// Maximum number of bullets kept.
pub const MAX_BULLETS: usize = 5;

/// Produces a short bulleted summary of retrieved content.
pub struct Summarizer {
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn ChatModel>, prompts: Prompts, max_input_chars: usize) -> Self {
        Self {
            llm,
            prompts,
            max_input_chars,
        }
    }

    /// Summarize content into 3 to 5 bullets.
    #[instrument(skip(self, content), fields(url = %content.url, model = %self.llm.model()))]
    pub async fn summarize(&self, content: &RetrievedContent) -> Result<Vec<String>> {
        let document = content.to_prompt_text();
        let (document, cut) = truncate_chars(&document, self.max_input_chars);
        if cut {
            debug!("Prompt content cut to {} characters", self.max_input_chars);
        }

        let mut vars = HashMap::new();
        vars.insert("kind".to_string(), content.kind.describe().to_string());
        vars.insert("url".to_string(), content.url.clone());
        vars.insert("content".to_string(), document.to_string());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.user, &vars);
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.system, &vars);

        let reply = self
            .llm
            .complete(&system_prompt, &user_prompt)
            .await
            .map_err(|e| SiftError::Summarization(format!("Summary request failed: {}", e)))?;

        let bullets = parse_bullets(&reply);
        if bullets.len() < MIN_BULLETS {
            return Err(SiftError::Summarization(format!(
                "Expected at least {} summary points, got {}",
                MIN_BULLETS,
                bullets.len()
            )));
        }

        info!("Summary has {} points", bullets.len());
        Ok(bullets)
    }
}

/// Parse bullet lines from a model reply.
///
/// Accepts `-`, `*`, `•` and numbered (`1.`, `1)`) prefixes, strips bold
/// markers, and keeps at most the first five bullets.
pub fn parse_bullets(reply: &str) -> Vec<String> {
    let prefix = Regex::new(r"^\s*(?:[-*•]|\d{1,2}[.)])\s+(.*)$").expect("Invalid regex");

    reply
        .lines()
        .filter_map(|line| prefix.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("**", "").trim().to_string())
        .filter(|bullet| !bullet.is_empty())
        .take(MAX_BULLETS)
        .collect()
}
