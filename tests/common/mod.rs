//! Shared test doubles for the pipeline backends

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use arca_gateway::pipeline::{
    LlmClient, StageTimeouts, SttClient, TtsClient, VoiceAssistant,
};
use arca_gateway::{Error, ModelMessage, Result, SessionRegistry};

/// Transcribes every clip to the same fixed text
pub struct FixedStt {
    pub text: String,
    pub healthy: bool,
}

impl FixedStt {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            healthy: true,
        }
    }
}

#[async_trait]
impl SttClient for FixedStt {
    async fn transcribe(&self, audio: &[u8], _language: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::Validation("audio payload is empty".into()));
        }
        Ok(self.text.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Replies from a fixed script, cycling when exhausted
pub struct ScriptedLlm {
    replies: Vec<String>,
    pub calls: AtomicUsize,
    pub healthy: bool,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| (*r).to_string()).collect(),
            calls: AtomicUsize::new(0),
            healthy: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _messages: &[ModelMessage]) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.replies[n % self.replies.len()].clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Always returns a blank completion
pub struct EmptyLlm;

#[async_trait]
impl LlmClient for EmptyLlm {
    async fn complete(&self, _messages: &[ModelMessage]) -> Result<String> {
        Ok(String::new())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Produces a tiny fixed clip for any text
pub struct SilentTts {
    pub healthy: bool,
}

impl SilentTts {
    pub fn new() -> Self {
        Self { healthy: true }
    }
}

#[async_trait]
impl TtsClient for SilentTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(vec![0x52, 0x49, 0x46, 0x46])
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Fails every synthesis request
pub struct FailingTts;

#[async_trait]
impl TtsClient for FailingTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(Error::Tts("synthesis backend down".into()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Assistant wired to well-behaved mocks
pub fn test_assistant(replies: &[&str]) -> VoiceAssistant {
    assistant_with(
        Arc::new(FixedStt::new("hola arca")),
        Arc::new(ScriptedLlm::new(replies)),
        Arc::new(SilentTts::new()),
        None,
    )
}

pub fn assistant_with(
    stt: Arc<dyn SttClient>,
    llm: Arc<dyn LlmClient>,
    tts: Arc<dyn TtsClient>,
    max_messages: Option<usize>,
) -> VoiceAssistant {
    let sessions = Arc::new(SessionRegistry::new(max_messages));
    VoiceAssistant::new(stt, llm, tts, sessions, StageTimeouts::default())
}
