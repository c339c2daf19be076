//! Per-session conversational memory
//!
//! A [`ConversationWindow`] holds one session's ordered transcript and
//! enforces the message bound; the [`SessionRegistry`] owns the windows
//! and hands out shared handles keyed by session id.

pub mod message;
pub mod registry;
pub mod window;

pub use message::{DisplayMessage, Message, ModelMessage, Role};
pub use registry::{spawn_sweeper, SessionRegistry, SharedWindow};
pub use window::{ConversationWindow, DEFAULT_SYSTEM_PROMPT};
