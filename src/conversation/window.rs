//! Conversation window: bounded per-session message history
//!
//! The window is the single owner of one session's messages and of the
//! trim policy that bounds them. System messages are pinned: the trim
//! policy never evicts them, even when they alone exceed the configured
//! bound. The bound is a soft target for non-system turns, not a hard cap
//! enforced against pinned content.

use uuid::Uuid;

use super::message::{DisplayMessage, Message, ModelMessage, Role};
use crate::{Error, Result};

/// System prompt seeded into windows created without an explicit one
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Eres A.R.C.A, un asistente conversacional inteligente y amigable.";

/// Ordered message history for one session
#[derive(Debug)]
pub struct ConversationWindow {
    session_id: Uuid,
    messages: Vec<Message>,
    max_messages: Option<usize>,
    active: bool,
}

impl ConversationWindow {
    /// Create a window, generating a session id when none is given
    ///
    /// `None` as the prompt seeds [`DEFAULT_SYSTEM_PROMPT`]; a blank
    /// prompt leaves the window unseeded.
    #[must_use]
    pub fn new(
        session_id: Option<Uuid>,
        max_messages: Option<usize>,
        system_prompt: Option<&str>,
    ) -> Self {
        let prompt = system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let messages = Message::system(prompt).into_iter().collect();

        Self {
            session_id: session_id.unwrap_or_else(Uuid::new_v4),
            messages,
            max_messages,
            active: true,
        }
    }

    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append a user turn
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InactiveConversation`] when the window is
    /// deactivated, or with a validation error for blank content.
    pub fn append_user(&mut self, content: &str) -> Result<()> {
        self.ensure_active()?;
        self.push(Message::user(content)?);
        Ok(())
    }

    /// Append an assistant turn
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InactiveConversation`] when the window is
    /// deactivated, or with a validation error for blank content.
    pub fn append_assistant(&mut self, content: &str) -> Result<()> {
        self.ensure_active()?;
        self.push(Message::assistant(content)?);
        Ok(())
    }

    /// Model-input projection of the current (already-trimmed) history
    #[must_use]
    pub fn for_model(&self) -> Vec<ModelMessage> {
        self.messages.iter().map(Message::model_view).collect()
    }

    /// Display projection of the current history
    #[must_use]
    pub fn for_display(&self) -> Vec<DisplayMessage> {
        self.messages.iter().map(Message::display_view).collect()
    }

    /// Most recent user message, if any
    #[must_use]
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role() == Role::User)
    }

    /// Most recent assistant message, if any
    #[must_use]
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::Assistant)
    }

    /// Drop history; when `keep_system` is set, system messages survive.
    /// Does not change the active flag.
    pub fn clear(&mut self, keep_system: bool) {
        if keep_system {
            self.messages.retain(|m| m.role() == Role::System);
        } else {
            self.messages.clear();
        }
    }

    /// Stop accepting appends without touching history
    pub const fn deactivate(&mut self) {
        self.active = false;
    }

    /// Resume accepting appends
    pub const fn reactivate(&mut self) {
        self.active = true;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(Error::InactiveConversation(self.session_id))
        }
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.enforce_limit();
    }

    /// Trim policy: keep every system message, then the most recent
    /// `max_messages - system_count` non-system messages (none when that
    /// quantity is not positive).
    fn enforce_limit(&mut self) {
        let Some(max) = self.max_messages else {
            return;
        };
        if self.messages.len() <= max {
            return;
        }

        let system_count = self
            .messages
            .iter()
            .filter(|m| m.role() == Role::System)
            .count();
        let keep = max.saturating_sub(system_count);

        let mut rebuilt: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.role() == Role::System)
            .cloned()
            .collect();

        if keep > 0 {
            let non_system: Vec<Message> = self
                .messages
                .iter()
                .filter(|m| m.role() != Role::System)
                .cloned()
                .collect();
            let start = non_system.len().saturating_sub(keep);
            rebuilt.extend_from_slice(&non_system[start..]);
        }

        self.messages = rebuilt;
    }
}
