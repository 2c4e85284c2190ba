//! Language model capability and its HTTP implementation.
//!
//! The pipeline only needs "prompt in, text out" at a chosen determinism,
//! expressed as the [`LanguageModel`] trait. [`LlmClient`] implements it
//! over plain HTTP:
//!
//! - OpenAI-compatible chat completions (OpenAI, Groq, local servers via `base_url`)
//! - Anthropic Messages API (claude-* models)

use crate::telemetry::record_token_usage;
use crate::types::{AskError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::Span;

/// Generation settings for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature. 0.0 keeps SQL synthesis reproducible.
    pub temperature: f32,
    /// Output token cap; provider default when `None`.
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Text-in, text-out model capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and spans.
    fn model_name(&self) -> &str;

    /// Send one prompt and wait for the whole response.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Llm` on transport, authentication or response
    /// parsing failures
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    OpenAI,
    Anthropic,
    /// In-process scripted model, no network
    Mock,
}

impl ProviderKind {
    /// Infer the provider from a model name.
    ///
    /// - `claude*` / `anthropic*` → Anthropic
    /// - `gpt*`, `o1*`, `o3*`, `o4*`, `chatgpt*` → OpenAI
    /// - `llama*`, `mixtral*`, `gemma*`, `qwen*`, `deepseek*` → Groq
    /// - `mock*` → Mock
    /// - anything else → OpenAI (OpenAI-compatible servers)
    pub fn infer(model: &str) -> Self {
        let model = model.to_lowercase();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| model.starts_with(p));

        if starts(&["claude", "anthropic"]) {
            Self::Anthropic
        } else if starts(&["llama", "mixtral", "gemma", "qwen", "deepseek"]) {
            Self::Groq
        } else if starts(&["mock"]) {
            Self::Mock
        } else {
            Self::OpenAI
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Mock => "",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn default_key_var(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Mock => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "mock" => Ok(Self::Mock),
            _ => Err(AskError::Config(format!("Unknown provider kind: {}", s))),
        }
    }
}

/// Text plus token usage, when the provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// OpenAI-compatible chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Anthropic Messages API response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

/// HTTP client for hosted language models.
pub struct LlmClient {
    provider: ProviderKind,
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl LlmClient {
    /// Create new client.
    ///
    /// # Arguments
    ///
    /// * `provider` - API flavour to speak
    /// * `model` - Model name (e.g., "llama3-70b-8192", "gpt-4o-mini")
    /// * `api_key` - API key for authentication
    pub fn new(provider: ProviderKind, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at another server (proxy, local OpenAI-compatible API).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn endpoint(&self) -> String {
        match self.provider {
            ProviderKind::Anthropic => format!("{}/messages", self.base_url),
            _ => format!("{}/chat/completions", self.base_url),
        }
    }

    /// Build the JSON request body for this provider.
    pub fn request_body(&self, prompt: &str, options: &GenerationOptions) -> serde_json::Value {
        match self.provider {
            ProviderKind::Anthropic => json!({
                "model": self.model,
                "max_tokens": options.max_tokens.unwrap_or(1024),
                "messages": [{"role": "user", "content": prompt}],
                "temperature": options.temperature,
            }),
            _ => {
                let mut body = json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": options.temperature,
                });
                if let Some(max_tokens) = options.max_tokens {
                    body["max_tokens"] = json!(max_tokens);
                }
                body
            }
        }
    }

    /// Parse a successful response body into text and usage.
    pub fn parse_response(provider: ProviderKind, body: &str) -> Result<Completion> {
        match provider {
            ProviderKind::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
                    AskError::Llm(format!("Failed to parse Anthropic response: {}", e))
                })?;
                let text: String = parsed.content.into_iter().filter_map(|c| c.text).collect();
                if text.is_empty() {
                    return Err(AskError::Llm("No text in Anthropic response".to_string()));
                }
                Ok(Completion {
                    text,
                    input_tokens: parsed.usage.as_ref().map(|u| u.input_tokens),
                    output_tokens: parsed.usage.as_ref().map(|u| u.output_tokens),
                })
            }
            _ => {
                let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
                    AskError::Llm(format!("Failed to parse chat completion response: {}", e))
                })?;
                let text = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| AskError::Llm("No choices in chat completion response".to_string()))?;
                Ok(Completion {
                    text,
                    input_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens),
                    output_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens),
                })
            }
        }
    }

    /// Send the request and return text plus usage.
    pub async fn request(&self, prompt: &str, options: &GenerationOptions) -> Result<Completion> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, options));

        request = match self.provider {
            ProviderKind::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
            _ => request.header("Authorization", format!("Bearer {}", self.api_key)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AskError::Llm(format!("{:?} API request failed: {}", self.provider, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::Llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::Llm(format!(
                "{:?} API error {}: {}",
                self.provider, status, body
            )));
        }

        let completion = Self::parse_response(self.provider, &body)?;
        record_token_usage(&Span::current(), completion.input_tokens, completion.output_tokens);
        tracing::debug!(
            model = %self.model,
            input_tokens = ?completion.input_tokens,
            output_tokens = ?completion.output_tokens,
            "LLM request completed"
        );
        Ok(completion)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.request(prompt, options).await.map(|c| c.text)
    }
}
