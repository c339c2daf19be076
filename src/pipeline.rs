//! Voice pipeline orchestration
//!
//! [`VoiceAssistant`] drives a turn through its three stages: speech to
//! text, chat completion against the conversation window, and speech
//! synthesis. Each stage runs under its own deadline and reports wall
//! time so callers can see where a slow turn went.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::conversation::{DisplayMessage, ModelMessage, SessionRegistry};
use crate::{Error, Result};

/// Speech-to-text backend
#[async_trait]
pub trait SttClient: Send + Sync {
    /// Transcribe a complete audio clip into text
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String>;

    /// Probe backend reachability
    async fn health_check(&self) -> bool;

    /// Release any resources held by the backend
    async fn cleanup(&self) {}
}

/// Chat completion backend
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Produce the assistant's reply for the given transcript
    async fn complete(&self, messages: &[ModelMessage]) -> Result<String>;

    /// Probe backend reachability
    async fn health_check(&self) -> bool;

    /// Release any resources held by the backend
    async fn cleanup(&self) {}
}

/// Text-to-speech backend
#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Render text into a WAV clip
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Probe backend availability
    async fn health_check(&self) -> bool;

    /// Release any resources held by the backend
    async fn cleanup(&self) {}
}

/// Per-stage deadlines for a pipeline turn
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub stt: Duration,
    pub llm: Duration,
    pub tts: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            stt: Duration::from_secs(30),
            llm: Duration::from_secs(60),
            tts: Duration::from_secs(30),
        }
    }
}

impl StageTimeouts {
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            stt: Duration::from_secs(config.stt.request_timeout_secs),
            llm: Duration::from_secs(config.llm.request_timeout_secs),
            tts: Duration::from_secs(config.tts.request_timeout_secs),
        }
    }
}

/// Wall-time breakdown of one turn, in seconds
///
/// Stage fields are absent when the stage did not run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<f64>,
    pub total: f64,
}

/// Result of a full speech-in, speech-out turn
#[derive(Debug, Clone)]
pub struct VoiceTurn {
    pub session_id: Uuid,
    pub transcribed_text: String,
    pub response_text: String,
    pub response_audio: Vec<u8>,
    pub timings: StageTimings,
}

/// Result of a text turn
///
/// Synthesized audio is produced when the TTS backend cooperates but is
/// not part of the serialized response.
#[derive(Debug, Clone, Serialize)]
pub struct TextTurn {
    pub session_id: Uuid,
    pub response_text: String,
    #[serde(skip)]
    pub response_audio: Option<Vec<u8>>,
    pub latency: StageTimings,
}

/// Liveness of each pipeline backend
///
/// `overall` tracks the stages a turn cannot complete without; synthesis
/// failures degrade a turn to text rather than failing it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthReport {
    pub stt: bool,
    pub llm: bool,
    pub tts: bool,
    pub overall: bool,
}

/// Orchestrates the three-stage pipeline around the session registry
pub struct VoiceAssistant {
    stt: Arc<dyn SttClient>,
    llm: Arc<dyn LlmClient>,
    tts: Arc<dyn TtsClient>,
    sessions: Arc<SessionRegistry>,
    timeouts: StageTimeouts,
    system_prompt: Option<String>,
}

impl VoiceAssistant {
    pub fn new(
        stt: Arc<dyn SttClient>,
        llm: Arc<dyn LlmClient>,
        tts: Arc<dyn TtsClient>,
        sessions: Arc<SessionRegistry>,
        timeouts: StageTimeouts,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            sessions,
            timeouts,
            system_prompt: None,
        }
    }

    /// Override the system prompt used when a turn creates a session
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Run a full voice turn: transcribe, complete, synthesize
    ///
    /// # Errors
    ///
    /// Fails on empty audio, on a stage timeout, or when any stage fails.
    /// A synthesis failure surfaces after both text messages are already
    /// committed, so the conversation still advances.
    pub async fn process_voice(
        &self,
        audio: &[u8],
        session_id: Option<Uuid>,
        language: &str,
    ) -> Result<VoiceTurn> {
        if audio.is_empty() {
            return Err(Error::Validation("audio payload is empty".into()));
        }

        let started = Instant::now();
        let session_id = session_id.unwrap_or_else(Uuid::new_v4);

        let stt_start = Instant::now();
        let transcribed_text = tokio::time::timeout(
            self.timeouts.stt,
            self.stt.transcribe(audio, language),
        )
        .await
        .map_err(|_| Error::Stt("transcription timed out".into()))??;
        let stt_secs = stt_start.elapsed().as_secs_f64();
        tracing::info!(session = %session_id, text = %transcribed_text, "audio transcribed");

        let (response_text, llm_secs) = self.run_turn(session_id, &transcribed_text).await?;

        let tts_start = Instant::now();
        let response_audio = tokio::time::timeout(
            self.timeouts.tts,
            self.tts.synthesize(&response_text),
        )
        .await
        .map_err(|_| Error::Tts("synthesis timed out".into()))??;
        let tts_secs = tts_start.elapsed().as_secs_f64();

        let timings = StageTimings {
            stt: Some(stt_secs),
            llm: Some(llm_secs),
            tts: Some(tts_secs),
            total: started.elapsed().as_secs_f64(),
        };
        tracing::info!(
            session = %session_id,
            total = timings.total,
            "voice turn complete"
        );

        Ok(VoiceTurn {
            session_id,
            transcribed_text,
            response_text,
            response_audio,
            timings,
        })
    }

    /// Run a text turn, skipping transcription
    ///
    /// Synthesis is best-effort here: the text exchange must be usable
    /// for diagnostics even when no speech backend is up, so a TTS
    /// failure only drops the audio from the result.
    ///
    /// # Errors
    ///
    /// Fails on blank input, on a completion timeout, or when the model
    /// returns an error or an empty reply.
    pub async fn process_text(&self, text: &str, session_id: Option<Uuid>) -> Result<TextTurn> {
        let started = Instant::now();
        let session_id = session_id.unwrap_or_else(Uuid::new_v4);

        let (response_text, llm_secs) = self.run_turn(session_id, text).await?;

        let tts_start = Instant::now();
        let (response_audio, tts_secs) = match tokio::time::timeout(
            self.timeouts.tts,
            self.tts.synthesize(&response_text),
        )
        .await
        {
            Ok(Ok(audio)) => (Some(audio), Some(tts_start.elapsed().as_secs_f64())),
            Ok(Err(e)) => {
                tracing::warn!(session = %session_id, error = %e, "synthesis skipped for text turn");
                (None, None)
            }
            Err(_) => {
                tracing::warn!(session = %session_id, "synthesis timed out for text turn");
                (None, None)
            }
        };

        Ok(TextTurn {
            session_id,
            response_text,
            response_audio,
            latency: StageTimings {
                stt: None,
                llm: Some(llm_secs),
                tts: tts_secs,
                total: started.elapsed().as_secs_f64(),
            },
        })
    }

    /// Append the user turn, ask the model, append its reply
    ///
    /// The window lock is held for the whole exchange so concurrent turns
    /// on one session serialize instead of interleaving their messages.
    async fn run_turn(&self, session_id: Uuid, user_text: &str) -> Result<(String, f64)> {
        let window = self
            .sessions
            .get_or_create(session_id, self.system_prompt.as_deref())
            .await;
        let mut window = window.lock().await;

        window.append_user(user_text)?;

        let llm_start = Instant::now();
        let reply = tokio::time::timeout(
            self.timeouts.llm,
            self.llm.complete(&window.for_model()),
        )
        .await
        .map_err(|_| Error::Llm("completion timed out".into()))??;
        let llm_secs = llm_start.elapsed().as_secs_f64();

        if reply.trim().is_empty() {
            return Err(Error::Llm("model returned an empty response".into()));
        }

        window.append_assistant(&reply)?;
        tracing::debug!(
            session = %session_id,
            messages = window.message_count(),
            "turn recorded"
        );

        Ok((reply, llm_secs))
    }

    /// Transcript of a session for display; `None` for untracked ids
    pub async fn history(&self, session_id: Uuid) -> Option<Vec<DisplayMessage>> {
        let window = self.sessions.get(session_id).await?;
        let window = window.lock().await;
        Some(window.for_display())
    }

    /// Clear a session's history; returns false when the id is untracked
    pub async fn clear(&self, session_id: Uuid, keep_system: bool) -> bool {
        self.sessions.clear(session_id, keep_system).await
    }

    /// Probe all three backends concurrently
    pub async fn health_check(&self) -> HealthReport {
        let (stt, llm, tts) = futures::join!(
            self.stt.health_check(),
            self.llm.health_check(),
            self.tts.health_check(),
        );

        let report = HealthReport {
            stt,
            llm,
            tts,
            overall: stt && llm,
        };
        tracing::debug!(?report, "health probes complete");
        report
    }

    /// Release backend resources before shutdown
    pub async fn cleanup(&self) {
        futures::join!(self.stt.cleanup(), self.llm.cleanup(), self.tts.cleanup());
    }
}
