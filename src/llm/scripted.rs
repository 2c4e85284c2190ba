//! In-process model that replays canned responses.
//!
//! Used by tests and by the `mock` provider for offline runs.

use crate::llm::client::{GenerationOptions, LanguageModel};
use crate::types::{AskError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Model that answers from a queue, then from an optional fallback.
///
/// Every prompt it receives is recorded so callers can assert on what the
/// pipeline sent and how many calls were made.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            ..Self::default()
        }
    }

    /// Model that returns `text` for every call.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::new()
        }
    }

    /// Queue a successful response.
    pub fn respond(mut self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()));
        self
    }

    /// Queue a failing call.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.push(Reply::Failure(message.into()));
        self
    }

    // Builders own the model, so a poisoned queue is still ours to extend.
    fn push(&mut self, reply: Reply) {
        self.replies
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| AskError::Llm("scripted model poisoned".to_string()))?
            .push(prompt.to_string());

        let next = self
            .replies
            .lock()
            .map_err(|_| AskError::Llm("scripted model poisoned".to_string()))?
            .pop_front();

        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(AskError::Llm(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AskError::Llm("scripted model has no response left".to_string())),
        }
    }
}
