//! Session registry: lifecycle and lookup of conversation windows
//!
//! The registry is the only component that creates or destroys windows.
//! The map lock guards insert/delete/sweep only; each window sits behind
//! its own mutex so mutation is serialized per session and unrelated
//! sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::window::ConversationWindow;
use crate::{Error, Result};

/// Handle to one session's window; the inner mutex serializes per-session
/// mutation
pub type SharedWindow = Arc<Mutex<ConversationWindow>>;

/// System prompt for registry-created conversations
const REGISTRY_SYSTEM_PROMPT: &str =
    "Eres A.R.C.A, un asistente conversacional inteligente y amigable. \
     Respondes de manera natural y concisa. \
     Recuerdas todo el contexto de la conversación.";

/// In-memory map of session id to conversation window
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedWindow>>,
    default_max_messages: Option<usize>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(default_max_messages: Option<usize>) -> Self {
        tracing::info!(
            max_messages = ?default_max_messages,
            "session registry initialized"
        );
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_max_messages,
        }
    }

    /// Create a new window, overwriting any existing entry for the id
    pub async fn create(
        &self,
        session_id: Option<Uuid>,
        system_prompt: Option<&str>,
    ) -> SharedWindow {
        let prompt = system_prompt.unwrap_or(REGISTRY_SYSTEM_PROMPT);
        let window =
            ConversationWindow::new(session_id, self.default_max_messages, Some(prompt));
        let id = window.session_id();
        let shared = Arc::new(Mutex::new(window));

        self.sessions
            .write()
            .await
            .insert(id, Arc::clone(&shared));
        tracing::info!(session = %id, "conversation created");
        shared
    }

    /// Pure lookup; absence is not exceptional
    pub async fn get(&self, session_id: Uuid) -> Option<SharedWindow> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Return the existing window or create one for the id
    ///
    /// Identity-stable: two calls with no intervening delete hand back the
    /// same window. The prompt only applies when a window is created.
    pub async fn get_or_create(
        &self,
        session_id: Uuid,
        system_prompt: Option<&str>,
    ) -> SharedWindow {
        if let Some(existing) = self.get(session_id).await {
            tracing::debug!(session = %session_id, "using existing conversation");
            return existing;
        }

        // Re-check under the write lock so concurrent callers for the same
        // id converge on one window
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session_id) {
            return Arc::clone(existing);
        }

        let prompt = system_prompt.unwrap_or(REGISTRY_SYSTEM_PROMPT);
        let window = ConversationWindow::new(
            Some(session_id),
            self.default_max_messages,
            Some(prompt),
        );
        let shared = Arc::new(Mutex::new(window));
        sessions.insert(session_id, Arc::clone(&shared));
        tracing::info!(session = %session_id, "conversation created");
        shared
    }

    /// Append a user turn to a tracked session
    ///
    /// # Errors
    ///
    /// Fails with [`Error::SessionNotFound`] when the id is untracked;
    /// callers that want create-or-resume semantics should use
    /// [`Self::get_or_create`] instead.
    pub async fn append_user_message(
        &self,
        session_id: Uuid,
        content: &str,
    ) -> Result<SharedWindow> {
        let window = self
            .get(session_id)
            .await
            .ok_or(Error::SessionNotFound(session_id))?;
        window.lock().await.append_user(content)?;
        tracing::debug!(session = %session_id, "user message appended");
        Ok(window)
    }

    /// Append an assistant turn to a tracked session
    ///
    /// # Errors
    ///
    /// Fails with [`Error::SessionNotFound`] when the id is untracked.
    pub async fn append_assistant_message(
        &self,
        session_id: Uuid,
        content: &str,
    ) -> Result<SharedWindow> {
        let window = self
            .get(session_id)
            .await
            .ok_or(Error::SessionNotFound(session_id))?;
        window.lock().await.append_assistant(content)?;
        tracing::debug!(session = %session_id, "assistant message appended");
        Ok(window)
    }

    /// Clear a session's history; returns false when the id is untracked
    pub async fn clear(&self, session_id: Uuid, keep_system: bool) -> bool {
        match self.get(session_id).await {
            Some(window) => {
                window.lock().await.clear(keep_system);
                tracing::info!(session = %session_id, keep_system, "conversation cleared");
                true
            }
            None => false,
        }
    }

    /// Remove a session entirely; returns whether it existed
    pub async fn delete(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            tracing::info!(session = %session_id, "conversation deleted");
        }
        removed
    }

    /// Number of tracked sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove every deactivated window; returns the number removed
    ///
    /// Windows locked by an in-flight request are skipped; a window in use
    /// is by definition not sweepable.
    pub async fn sweep_inactive(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut removed = 0;

        sessions.retain(|id, window| {
            let sweepable = window.try_lock().is_ok_and(|w| !w.is_active());
            if sweepable {
                tracing::debug!(session = %id, "sweeping inactive conversation");
                removed += 1;
            }
            !sweepable
        });

        removed
    }
}

/// Spawn a periodic task that sweeps deactivated conversations
pub fn spawn_sweeper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = registry.sweep_inactive().await;
            if removed > 0 {
                let remaining = registry.count().await;
                tracing::info!(removed, remaining, "swept inactive conversations");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_overwrites_existing_entry() {
        let registry = SessionRegistry::new(None);
        let id = Uuid::new_v4();

        let first = registry.create(Some(id), None).await;
        first.lock().await.append_user("hola").unwrap();

        let second = registry.create(Some(id), None).await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);
        assert!(second.lock().await.last_user_message().is_none());
    }

    #[tokio::test]
    async fn get_or_create_is_identity_stable() {
        let registry = SessionRegistry::new(None);
        let id = Uuid::new_v4();

        let first = registry.get_or_create(id, None).await;
        first.lock().await.append_user("hola").unwrap();

        let second = registry.get_or_create(id, None).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            second.lock().await.last_user_message().unwrap().content(),
            "hola"
        );
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let registry = SessionRegistry::new(None);
        let window = registry.create(None, None).await;
        let id = window.lock().await.session_id();

        assert!(registry.delete(id).await);
        assert!(!registry.delete(id).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn clear_is_false_for_unknown_session() {
        let registry = SessionRegistry::new(None);
        assert!(!registry.clear(Uuid::new_v4(), true).await);
    }

    #[tokio::test]
    async fn append_to_unknown_session_fails() {
        let registry = SessionRegistry::new(None);
        let err = registry
            .append_user_message(Uuid::new_v4(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn windows_use_registry_default_bound() {
        let registry = SessionRegistry::new(Some(3));
        let window = registry.create(None, Some("pinned")).await;

        {
            let mut w = window.lock().await;
            for i in 0..10 {
                w.append_user(&format!("m{i}")).unwrap();
            }
            assert_eq!(w.message_count(), 3);
        }
    }
}
