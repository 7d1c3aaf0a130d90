//! Scripted chat model for tests and offline runs.
//!
//! Replies are returned in the order they were queued. Every prompt is
//! recorded so tests can assert on what the pipeline sent.

use super::ChatModel;
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A queued reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error(String),
}

/// A prompt the model received.
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    pub system: String,
    pub user: String,
}

/// Chat model that replays a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(ScriptedReply::Text(text.into()));
        self
    }

    /// Queue a failing call.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(ScriptedReply::Error(message.into()));
        self
    }

    /// All prompts received so far.
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedPrompt {
                system: system.to_string(),
                user: user.to_string(),
            });

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error(message)) => Err(SiftError::Llm(message)),
            None => Err(SiftError::Llm("script exhausted".to_string())),
        }
    }
}
