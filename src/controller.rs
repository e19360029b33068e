//! Robot-side half of the turn protocol
//!
//! The controller waits (optionally) for the wake word, then alternates
//! between idling while the front-end owns the turn and delivering the
//! reply once the turn is handed over:
//!
//! ```text
//! Dormant ──wake word──▶ AwaitingTurn ──turn=respond──▶ AwaitingResponse
//!                             ▲                               │
//!                             └──speak, clear, turn=listen────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::idle::{IdleScheduler, WaitCue};
use crate::poll::Reactor;
use crate::robot::{Robot, posture};
use crate::store::SharedState;
use crate::turn::{self, Turn};

/// Recognizer subscriber name used for wake word detection
pub const RECOGNIZER_SUBSCRIBER: &str = "WakeWordDetection";

/// Controller behavior settings
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Phrase that engages the robot
    pub wake_word: String,
    /// Stay dormant until the wake word is heard
    pub require_wake_word: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            wake_word: "Hey Dave".to_string(),
            require_wake_word: true,
        }
    }
}

/// Where the controller is in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// Waiting for the wake word
    Dormant,
    /// Front-end owns the turn
    AwaitingTurn,
    /// Turn handed over, waiting for a ready payload
    AwaitingResponse,
}

/// Robot-side protocol driver
pub struct Controller {
    store: Arc<dyn SharedState>,
    robot: Arc<dyn Robot>,
    idle: IdleScheduler,
    settings: ControllerSettings,
    phase: ControllerPhase,
    posture: Option<String>,
    /// Reply was spoken but the handoff writes have not landed yet
    handoff_pending: bool,
    delivered: u64,
}

impl Controller {
    #[must_use]
    pub fn new(
        store: Arc<dyn SharedState>,
        robot: Arc<dyn Robot>,
        idle: IdleScheduler,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            store,
            robot,
            idle,
            settings,
            phase: ControllerPhase::Dormant,
            posture: None,
            handoff_pending: false,
            delivered: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Number of replies delivered since start
    #[must_use]
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }

    /// One-time startup: recognizer vocabulary and resting posture
    ///
    /// Recognizer failures are logged and ignored. Without wake word gating
    /// the controller engages immediately and resumes from the stored turn.
    ///
    /// # Errors
    ///
    /// Returns error if the posture or the initial turn cannot be set
    pub async fn prepare(&mut self) -> Result<()> {
        if let Err(e) = self.robot.pause_recognizer(true).await {
            tracing::warn!(error = %e, "could not pause the recognizer");
        }
        if let Err(e) = self
            .robot
            .set_vocabulary(std::slice::from_ref(&self.settings.wake_word))
            .await
        {
            tracing::warn!(error = %e, "could not set recognizer vocabulary");
        }
        if let Err(e) = self.robot.pause_recognizer(false).await {
            tracing::warn!(error = %e, "could not resume the recognizer");
        }
        if let Err(e) = self.robot.subscribe_recognizer(RECOGNIZER_SUBSCRIBER).await {
            tracing::warn!(error = %e, "could not subscribe to the recognizer");
        }

        self.ensure_posture(posture::SIT).await?;

        if self.settings.require_wake_word {
            tracing::info!(wake_word = %self.settings.wake_word, "waiting for wake word");
        } else {
            self.engage().await?;
        }

        Ok(())
    }

    async fn ensure_posture(&mut self, name: &str) -> Result<()> {
        if self.posture.as_deref() != Some(name) {
            self.robot.set_posture(name).await?;
            self.posture = Some(name.to_string());
        }
        Ok(())
    }

    async fn engage(&mut self) -> Result<()> {
        self.ensure_posture(posture::STAND).await?;
        self.robot.center_head().await?;
        self.idle.reset();

        self.phase = match self.store.get_turn() {
            Turn::Respond => {
                tracing::info!("engaged with a reply pending");
                ControllerPhase::AwaitingResponse
            }
            // `listen` is the front-end's phase: no write here
            Turn::Listen => {
                tracing::info!("engaged, front-end may listen");
                ControllerPhase::AwaitingTurn
            }
        };

        Ok(())
    }

    async fn poll_wake_word(&mut self) -> Result<()> {
        let Some(word) = self.robot.last_recognized_word().await? else {
            return Ok(());
        };

        if word.trim().to_lowercase() == self.settings.wake_word.trim().to_lowercase() {
            tracing::info!(word = %word, "wake word detected");
            self.engage().await?;
        }

        Ok(())
    }

    async fn await_turn(&mut self) -> Result<()> {
        if self.store.get_turn() == Turn::Respond {
            tracing::debug!("turn handed to controller");
            self.phase = ControllerPhase::AwaitingResponse;
            return self.await_response().await;
        }

        self.idle.tick(self.robot.as_ref(), WaitCue::AwaitingTurn).await?;
        Ok(())
    }

    async fn await_response(&mut self) -> Result<()> {
        if self.handoff_pending {
            return self.hand_back();
        }

        if self.store.get_turn() != Turn::Respond {
            tracing::debug!("turn returned to listen before a reply arrived");
            self.phase = ControllerPhase::AwaitingTurn;
            return Ok(());
        }

        let payload = self.store.get_response()?;
        if turn::is_ready(&payload) {
            return self.deliver(&payload).await;
        }

        self.idle.tick(self.robot.as_ref(), WaitCue::AwaitingResponse).await?;
        Ok(())
    }

    /// Speak the reply and give the turn back
    ///
    /// The handoff happens even if speech fails so the protocol never stalls
    /// in `respond`.
    async fn deliver(&mut self, payload: &str) -> Result<()> {
        if let Err(e) = self.robot.center_head().await {
            tracing::warn!(error = %e, "could not center head before speaking");
        }

        tracing::info!(response = payload, "speaking");
        if let Err(e) = self.robot.speak(payload).await {
            tracing::warn!(error = %e, "speech failed, handing turn back anyway");
        }

        self.handoff_pending = true;
        self.hand_back()
    }

    fn hand_back(&mut self) -> Result<()> {
        self.store.clear_response()?;
        self.store.set_turn(Turn::Listen)?;

        self.handoff_pending = false;
        self.delivered += 1;
        self.phase = ControllerPhase::AwaitingTurn;
        self.idle.reset();
        tracing::debug!(delivered = self.delivered, "turn handed back to front-end");
        Ok(())
    }
}

#[async_trait]
impl Reactor for Controller {
    fn name(&self) -> &'static str {
        "controller"
    }

    async fn tick(&mut self) -> Result<()> {
        match self.phase {
            ControllerPhase::Dormant => self.poll_wake_word().await,
            ControllerPhase::AwaitingTurn => self.await_turn().await,
            ControllerPhase::AwaitingResponse => self.await_response().await,
        }
    }
}
