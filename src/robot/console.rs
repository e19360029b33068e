//! Simulated robot that logs every action
//!
//! Useful without hardware: the turn protocol runs unchanged and the
//! robot's side of the conversation shows up in the log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::Robot;
use crate::Result;

/// Robot backend backed by `tracing` output
pub struct ConsoleRobot {
    wake_word: Option<String>,
    woke: AtomicBool,
}

impl ConsoleRobot {
    /// Create a console robot
    ///
    /// With `auto_wake` set, the recognizer reports `wake_word` once so a
    /// gated controller engages immediately.
    #[must_use]
    pub fn new(wake_word: &str, auto_wake: bool) -> Self {
        Self {
            wake_word: auto_wake.then(|| wake_word.to_string()),
            woke: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Robot for ConsoleRobot {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        tracing::info!(text, "robot says");
        println!("Assistant: {text}");
        Ok(())
    }

    async fn move_head(&self, yaw: f64, pitch: f64) -> Result<()> {
        tracing::debug!(yaw, pitch, "head moved");
        Ok(())
    }

    async fn center_head(&self) -> Result<()> {
        tracing::debug!("head centered");
        Ok(())
    }

    async fn set_posture(&self, name: &str) -> Result<()> {
        tracing::info!(posture = name, "posture changed");
        Ok(())
    }

    async fn set_led_pattern(&self, color: u32, duration: Duration) -> Result<()> {
        tracing::trace!(color = format!("{color:06X}"), ?duration, "eye leds");
        Ok(())
    }

    async fn run_behavior(&self, id: &str) -> Result<()> {
        tracing::debug!(behavior = id, "behavior started");
        Ok(())
    }

    async fn pause_recognizer(&self, paused: bool) -> Result<()> {
        tracing::debug!(paused, "recognizer pause toggled");
        Ok(())
    }

    async fn set_vocabulary(&self, words: &[String]) -> Result<()> {
        tracing::debug!(?words, "recognizer vocabulary set");
        Ok(())
    }

    async fn subscribe_recognizer(&self, subscriber: &str) -> Result<()> {
        tracing::debug!(subscriber, "recognizer subscribed");
        Ok(())
    }

    async fn last_recognized_word(&self) -> Result<Option<String>> {
        if self.woke.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.wake_word.clone())
    }
}
