//! Conversation message value object and its two projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Role of a conversational turn
///
/// The set is closed and matched exhaustively; adding a role is a
/// compile-time-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversational turn
///
/// Immutable after construction. Equality and hashing are by value
/// (role, content and timestamp), not identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

/// Model-input projection of a message: role and content only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    pub content: String,
}

/// Display projection of a message, with an RFC 3339 timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    fn new(role: Role, content: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation(
                "message content cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Create a system message
    ///
    /// # Errors
    ///
    /// Returns a validation error if the trimmed content is empty
    pub fn system(content: &str) -> Result<Self> {
        Self::new(Role::System, content)
    }

    /// Create a user message
    ///
    /// # Errors
    ///
    /// Returns a validation error if the trimmed content is empty
    pub fn user(content: &str) -> Result<Self> {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    ///
    /// # Errors
    ///
    /// Returns a validation error if the trimmed content is empty
    pub fn assistant(content: &str) -> Result<Self> {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Model-input projection (no timestamp)
    #[must_use]
    pub fn model_view(&self) -> ModelMessage {
        ModelMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }

    /// Display projection, with the creation time as RFC 3339
    #[must_use]
    pub fn display_view(&self) -> DisplayMessage {
        DisplayMessage {
            role: self.role,
            content: self.content.clone(),
            timestamp: self.created_at.to_rfc3339(),
        }
    }
}
