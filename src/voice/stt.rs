//! Whisper transcription client
//!
//! Talks to a faster-whisper server over its OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SttConfig;
use crate::pipeline::SttClient;
use crate::{Error, Result};

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct WhisperStt {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl WhisperStt {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &SttConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SttClient for WhisperStt {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::Validation("audio payload is empty".into()));
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Stt(format!("invalid audio part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", language.to_string());

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Stt(format!("request to transcription server failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!(
                "transcription server returned {status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("invalid transcription payload: {e}")))?;

        let text = parsed.text.trim().to_string();
        tracing::debug!(chars = text.len(), "transcription received");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "transcription server health probe failed");
                false
            }
        }
    }
}
