//! Speech and LLM capability surface used by the front-end

mod mic;
mod stdin;

use async_trait::async_trait;

pub use mic::{MicSettings, MicTranscriber};
pub use stdin::StdinTranscriber;

use crate::Result;
use crate::history::ChatMessage;

/// Produces one user utterance as text
#[async_trait]
pub trait Transcriber: Send {
    /// Block until the user has said something
    ///
    /// Returns `None` when speech was heard but nothing was understood.
    async fn capture_utterance(&mut self) -> Result<Option<String>>;
}

/// Produces the assistant's reply for a conversation
#[async_trait]
pub trait Completer: Send + Sync {
    /// Complete the conversation with one assistant message
    async fn complete(&self, history: &[ChatMessage]) -> Result<String>;
}
