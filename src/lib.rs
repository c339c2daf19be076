//! A.R.C.A gateway: a voice conversation service
//!
//! Orchestrates a three-stage pipeline around per-session conversational
//! memory:
//!
//! ```text
//!   audio ──> whisper STT ──> conversation window ──> LM Studio chat
//!                                                            │
//!   audio <── espeak / openai TTS <── assistant reply <──────┘
//! ```
//!
//! Sessions live in an in-memory registry keyed by UUID; each window
//! keeps a bounded transcript with system messages pinned through
//! eviction. The HTTP surface exposes voice and text turns, history
//! inspection, and backend health.

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod voice;

pub use config::Config;
pub use conversation::{
    ConversationWindow, DisplayMessage, Message, ModelMessage, Role, SessionRegistry, SharedWindow,
};
pub use error::{Error, Result};
pub use pipeline::{HealthReport, StageTimeouts, StageTimings, VoiceAssistant};
