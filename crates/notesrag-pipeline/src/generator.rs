//! Answer generators: an OpenAI-compatible chat client and an offline echo.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use notesrag_core::config::{LlmConfig, LlmProvider};
use notesrag_core::traits::AnswerGenerator;
use notesrag_core::{Error, Result};

/// Client for `POST {base_url}/chat/completions`. The prompt is sent as a
/// single user message.
pub struct OpenAiChatGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiChatGenerator {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::generation(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }
}

impl AnswerGenerator for OpenAiChatGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage { role: "user", content: prompt }],
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::generation(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::generation(format!("HTTP {status}: {}", body.trim())));
        }
        let parsed: ChatResponse =
            response.json().map_err(|e| Error::generation(format!("malformed response: {e}")))?;
        first_choice(parsed)
    }
}

pub(crate) fn first_choice(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::generation("response contained no answer"))
}

/// Returns the rendered prompt unchanged. Used offline and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoGenerator;

impl AnswerGenerator for EchoGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

pub fn default_generator(config: &LlmConfig) -> Result<Arc<dyn AnswerGenerator>> {
    match config.provider {
        LlmProvider::Echo => {
            tracing::info!("using echo answer generator");
            Ok(Arc::new(EchoGenerator))
        }
        LlmProvider::OpenAi => {
            let key = config.api_key().ok_or_else(|| {
                Error::InvalidConfig("llm.api_key is not set and OPENAI_API_KEY is empty".into())
            })?;
            tracing::info!(model = %config.model, temperature = config.temperature, "using OpenAI chat generator");
            Ok(Arc::new(OpenAiChatGenerator::new(config, key)?))
        }
    }
}
