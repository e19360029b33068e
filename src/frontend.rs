//! Speech/LLM-side half of the turn protocol
//!
//! While the turn is `listen` the front-end captures one utterance, asks the
//! completer for a reply, writes the payload and only then passes the turn.
//! While the turn is `respond` it does nothing but poll.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::history::ConversationHistory;
use crate::poll::Reactor;
use crate::speech::{Completer, Transcriber};
use crate::store::SharedState;
use crate::turn::Turn;

/// Front-end protocol driver
pub struct FrontEnd<T, C> {
    store: Arc<dyn SharedState>,
    transcriber: T,
    completer: C,
    history: ConversationHistory,
    /// Utterance already in history whose completion has not succeeded yet
    pending: Option<String>,
    /// Reply that still has to be published to the store
    outbox: Option<String>,
}

impl<T: Transcriber, C: Completer> FrontEnd<T, C> {
    #[must_use]
    pub fn new(
        store: Arc<dyn SharedState>,
        transcriber: T,
        completer: C,
        history: ConversationHistory,
    ) -> Self {
        Self {
            store,
            transcriber,
            completer,
            history,
            pending: None,
            outbox: None,
        }
    }

    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Utterance waiting for a successful completion, if any
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Payload first, turn second: a reader that sees `respond` always
    /// finds the new payload.
    fn publish(&mut self, reply: String) -> Result<()> {
        let written = self
            .store
            .set_response(&reply)
            .and_then(|()| self.store.set_turn(Turn::Respond));

        if let Err(e) = written {
            self.outbox = Some(reply);
            return Err(e);
        }

        tracing::info!("turn passed to controller");
        Ok(())
    }
}

#[async_trait]
impl<T: Transcriber, C: Completer> Reactor for FrontEnd<T, C> {
    fn name(&self) -> &'static str {
        "frontend"
    }

    async fn tick(&mut self) -> Result<()> {
        if self.store.get_turn() == Turn::Respond {
            return Ok(());
        }

        if let Some(reply) = self.outbox.take() {
            return self.publish(reply);
        }

        if self.pending.is_none() {
            let Some(utterance) = self.transcriber.capture_utterance().await? else {
                return Ok(());
            };
            tracing::info!(user = %utterance, "user said");
            self.history.push_user(utterance.clone());
            self.pending = Some(utterance);
        }

        let reply = self.completer.complete(self.history.messages()).await?;
        self.pending = None;

        tracing::info!(assistant = %reply, "reply ready");
        self.history.push_assistant(reply.clone());
        if let Err(e) = self.history.save() {
            tracing::warn!(error = %e, "failed to save history");
        }

        self.publish(reply)
    }
}
