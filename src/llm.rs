//! LM Studio chat completion client
//!
//! Speaks the OpenAI-compatible `/chat/completions` endpoint that LM
//! Studio exposes locally. The bearer token is a placeholder: local
//! servers require the header but never check it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::conversation::{ModelMessage, Role};
use crate::pipeline::LlmClient;
use crate::{Error, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ModelMessage],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
    /// Populated by reasoning models that put the answer outside `content`
    #[serde(default)]
    reasoning_content: Option<String>,
}

pub struct LmStudioClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    health_timeout: Duration,
}

impl LmStudioClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    async fn chat(
        &self,
        messages: &[ModelMessage],
        max_tokens: u32,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth("not-needed")
            .json(&request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Llm(format!("request to model server failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "model server returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("invalid completion payload: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("completion had no choices".into()))?;

        let mut text = choice.message.content.trim().to_string();
        if text.is_empty() {
            if let Some(reasoning) = choice.message.reasoning_content {
                text = reasoning.trim().to_string();
            }
        }

        if text.is_empty() {
            return Err(Error::Llm("model returned an empty response".into()));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for LmStudioClient {
    async fn complete(&self, messages: &[ModelMessage]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::Llm("no messages to complete".into()));
        }
        tracing::debug!(model = %self.model, messages = messages.len(), "requesting completion");
        self.chat(messages, self.max_tokens, None).await
    }

    /// A tiny real completion; a reachable server that cannot generate is
    /// just as unhealthy as an unreachable one
    async fn health_check(&self) -> bool {
        let probe = [ModelMessage {
            role: Role::User,
            content: "Hi".into(),
        }];
        match self.chat(&probe, 5, Some(self.health_timeout)).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "model server health probe failed");
                false
            }
        }
    }
}
