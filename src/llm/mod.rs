//! Chat model abstraction.
//!
//! The pipeline only ever asks the model for content: a summary, a list of
//! claims, or a verdict. Every call is a single system + user exchange.

pub mod mock;
mod openai;

pub use mock::ScriptedModel;
pub use openai::OpenAIChat;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for chat completion providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send one system + user exchange and return the text of the reply.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Extract the first complete JSON value that starts with `open` from a reply.
///
/// Models often wrap JSON in prose or code fences, and may cite `[n]` after
/// it. Each `open` position is tried in turn and the first one that parses
/// wins. Falls back to the whole reply when none does.
pub fn extract_json(response: &str, open: char) -> &str {
    for (start, _) in response.match_indices(open) {
        let tail = &response[start..];
        let mut values = serde_json::Deserializer::from_str(tail).into_iter::<serde_json::Value>();
        if let Some(Ok(_)) = values.next() {
            return &tail[..values.byte_offset()];
        }
    }

    response.trim()
}

/// Truncate text to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fence() {
        let response = "Here you go:\n```json\n[\"a\", \"b\"]\n```\nDone.";
        assert_eq!(extract_json(response, '['), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_extract_json_object() {
        let response = "Verdict: {\"verdict\": \"mixed\"} hope that helps";
        assert_eq!(extract_json(response, '{'), "{\"verdict\": \"mixed\"}");
    }

    #[test]
    fn test_extract_json_stops_at_first_value() {
        let response = "[\"a\", \"b\"]\n\nNote: claim [2] is disputed.";
        assert_eq!(extract_json(response, '['), "[\"a\", \"b\"]");

        let response = "{\"verdict\": \"mixed\"} based on [1] and {2}";
        assert_eq!(extract_json(response, '{'), "{\"verdict\": \"mixed\"}");
    }

    #[test]
    fn test_extract_json_skips_unparsable_brackets() {
        let response = "Claims [see below]: [\"a\"]";
        assert_eq!(extract_json(response, '['), "[\"a\"]");
    }

    #[test]
    fn test_extract_json_without_delimiters() {
        assert_eq!(extract_json("  nothing here ", '['), "nothing here");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 10), ("héllo", false));
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
    }
}
