//! Answer provider implementations.
//!
//! Concrete backends for [`docqa_core::synth::AnswerProvider`]:
//! - **[`DisabledAnswerProvider`]**: fails every call, so queries that reach
//!   synthesis surface `synthesis_failed`.
//! - **[`OpenAIChatProvider`]**: Chat Completions with `response_format: json_object`.
//! - **[`OllamaChatProvider`]**: `/api/chat` with `format: "json"`.
//!
//! Both network providers share the retry loop of the embedding providers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use docqa_core::synth::AnswerProvider;

use crate::config::LlmConfig;
use crate::embedding::post_json_with_retry;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub struct DisabledAnswerProvider;

#[async_trait]
impl AnswerProvider for DisabledAnswerProvider {
    fn name(&self) -> &str {
        "disabled"
    }
    fn is_enabled(&self) -> bool {
        false
    }
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

/// OpenAI Chat Completions. Requires `OPENAI_API_KEY`.
pub struct OpenAIChatProvider {
    model: String,
    temperature: f32,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIChatProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("llm.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model,
            temperature: config.temperature,
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl AnswerProvider for OpenAIChatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
        });
        let json = post_json_with_retry(
            &self.client,
            OPENAI_CHAT_URL,
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await?;
        json.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
    }
}

/// Ollama chat endpoint in JSON mode.
pub struct OllamaChatProvider {
    model: String,
    temperature: f32,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaChatProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("llm.model required for Ollama provider"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model,
            temperature: config.temperature,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl AnswerProvider for OllamaChatProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "stream": false,
            "format": "json",
            "options": {"temperature": self.temperature},
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
        });
        let json = post_json_with_retry(
            &self.client,
            &format!("{}/api/chat", self.url.trim_end_matches('/')),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await?;
        json.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid Ollama response: missing message.content"))
    }
}

/// Create the [`AnswerProvider`] named by the configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn AnswerProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledAnswerProvider)),
        "openai" => Ok(Arc::new(OpenAIChatProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaChatProvider::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
