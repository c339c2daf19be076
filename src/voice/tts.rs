//! Speech synthesis backends
//!
//! Two interchangeable backends: a local espeak-ng subprocess rendering
//! to a temp WAV file, and an OpenAI-compatible `/v1/audio/speech`
//! endpoint. Selection is driven by config.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TtsConfig;
use crate::pipeline::TtsClient;
use crate::{Error, Result};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f64,
    response_format: &'a str,
}

#[derive(Debug)]
enum Backend {
    Espeak {
        binary: PathBuf,
        rate: u32,
        amplitude: u32,
        voice: Option<String>,
    },
    OpenAi {
        http: reqwest::Client,
        base_url: String,
        model: String,
        voice: String,
        speed: f64,
        api_key: Option<String>,
    },
}

#[derive(Debug)]
pub struct TextToSpeech {
    backend: Backend,
}

impl TextToSpeech {
    /// Build the backend named by `config.backend`
    ///
    /// # Errors
    ///
    /// Fails when the backend name is unknown, when espeak-ng is not on
    /// the PATH, or when the OpenAI backend lacks a base URL.
    pub fn from_config(config: &TtsConfig) -> Result<Self> {
        let backend = match config.backend.as_str() {
            "espeak" => {
                let binary = which::which("espeak-ng")
                    .or_else(|_| which::which("espeak"))
                    .map_err(|_| {
                        Error::Config("espeak-ng not found on PATH".into())
                    })?;
                tracing::info!(binary = %binary.display(), "using espeak synthesis");
                Backend::Espeak {
                    binary,
                    rate: config.rate,
                    // espeak takes amplitude 0-200; config volume is 0.0-1.0
                    amplitude: (config.volume.clamp(0.0, 1.0) * 200.0) as u32,
                    voice: config.voice.clone(),
                }
            }
            "openai" => {
                let base_url = config.base_url.clone().ok_or_else(|| {
                    Error::Config("tts.base_url is required for the openai backend".into())
                })?;
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.request_timeout_secs))
                    .build()
                    .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
                tracing::info!(base_url = %base_url, "using openai-compatible synthesis");
                Backend::OpenAi {
                    http,
                    base_url: base_url.trim_end_matches('/').to_string(),
                    model: config.model.clone(),
                    voice: config.voice.clone().unwrap_or_else(|| "alloy".to_string()),
                    speed: config.speed,
                    api_key: config.api_key.clone(),
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown tts backend '{other}', expected 'espeak' or 'openai'"
                )));
            }
        };

        Ok(Self { backend })
    }
}

/// Argument list for one espeak invocation
fn espeak_args(
    rate: u32,
    amplitude: u32,
    voice: Option<&str>,
    wav_path: &Path,
    text: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-s".into(),
        rate.to_string().into(),
        "-a".into(),
        amplitude.to_string().into(),
        "-w".into(),
        wav_path.into(),
    ];
    if let Some(voice) = voice {
        args.push("-v".into());
        args.push(voice.into());
    }
    args.push(text.into());
    args
}

/// Render text to WAV through the espeak binary
///
/// espeak blocks on subprocess IO, so this runs on the blocking pool.
async fn synthesize_espeak(
    binary: PathBuf,
    rate: u32,
    amplitude: u32,
    voice: Option<String>,
    text: String,
) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || {
        let dir = tempfile::tempdir()
            .map_err(|e| Error::Tts(format!("failed to create temp dir: {e}")))?;
        let wav_path = dir.path().join("speech.wav");

        let output = Command::new(&binary)
            .args(espeak_args(
                rate,
                amplitude,
                voice.as_deref(),
                &wav_path,
                &text,
            ))
            .output()
            .map_err(|e| Error::Tts(format!("failed to run espeak: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Tts(format!("espeak failed: {stderr}")));
        }

        std::fs::read(&wav_path)
            .map_err(|e| Error::Tts(format!("failed to read synthesized audio: {e}")))
    })
    .await
    .map_err(|e| Error::Tts(format!("synthesis task panicked: {e}")))?
}

#[async_trait]
impl TtsClient for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::Validation("cannot synthesize empty text".into()));
        }

        match &self.backend {
            Backend::Espeak {
                binary,
                rate,
                amplitude,
                voice,
            } => {
                synthesize_espeak(
                    binary.clone(),
                    *rate,
                    *amplitude,
                    voice.clone(),
                    text.to_string(),
                )
                .await
            }
            Backend::OpenAi {
                http,
                base_url,
                model,
                voice,
                speed,
                api_key,
            } => {
                let request = SpeechRequest {
                    model,
                    input: text,
                    voice,
                    speed: *speed,
                    response_format: "wav",
                };

                let mut builder = http.post(format!("{base_url}/v1/audio/speech")).json(&request);
                if let Some(key) = api_key {
                    builder = builder.bearer_auth(key);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| Error::Tts(format!("request to speech server failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Tts(format!(
                        "speech server returned {status}: {body}"
                    )));
                }

                let audio = response
                    .bytes()
                    .await
                    .map_err(|e| Error::Tts(format!("failed to read audio body: {e}")))?;
                Ok(audio.to_vec())
            }
        }
    }

    async fn health_check(&self) -> bool {
        match &self.backend {
            Backend::Espeak { binary, .. } => binary.exists(),
            Backend::OpenAi { http, base_url, .. } => match http.get(base_url).send().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "speech server health probe failed");
                    false
                }
            },
        }
    }
}
