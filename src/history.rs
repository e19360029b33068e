//! Conversation history owned by the front-end
//!
//! Persisted as a JSON array of `{"role", "content"}` records. The controller
//! never reads or writes it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::store::write_atomic;

/// Default history file name
pub const HISTORY_FILE: &str = "history.json";

/// Author of a history record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One history record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only log with a system prompt at its head
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    path: PathBuf,
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    /// Load history from `path`
    ///
    /// Missing or malformed files yield a history holding only the system prompt.
    #[must_use]
    pub fn load(path: &Path, system_prompt: &str) -> Self {
        let messages = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<ChatMessage>>(&content) {
                Ok(messages) if !messages.is_empty() => {
                    tracing::info!(
                        path = %path.display(),
                        count = messages.len(),
                        "loaded history"
                    );
                    messages
                }
                Ok(_) => vec![ChatMessage::system(system_prompt)],
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "malformed history, starting fresh"
                    );
                    vec![ChatMessage::system(system_prompt)]
                }
            },
            Err(_) => vec![ChatMessage::system(system_prompt)],
        };

        Self {
            path: path.to_path_buf(),
            system_prompt: system_prompt.to_string(),
            messages,
        }
    }

    /// Start a fresh session at `path`, overwriting whatever was stored
    ///
    /// # Errors
    ///
    /// Returns error if the reset history cannot be written
    pub fn reset(path: &Path, system_prompt: &str) -> Result<Self> {
        let history = Self {
            path: path.to_path_buf(),
            system_prompt: system_prompt.to_string(),
            messages: vec![ChatMessage::system(system_prompt)],
        };
        history.save()?;
        tracing::info!(path = %path.display(), "history reset");
        Ok(history)
    }

    /// Persist the history
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.messages)?;
        write_atomic(&self.path, &json)
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
