//! Robot capability surface
//!
//! The controller treats the robot purely as a set of capabilities. Each
//! backend implements the `Robot` trait to provide them.

mod console;
mod http;

use std::time::Duration;

use async_trait::async_trait;

pub use console::ConsoleRobot;
pub use http::HttpRobot;

use crate::Result;

/// Posture names understood by the robot
pub mod posture {
    pub const SIT: &str = "Sit";
    pub const STAND: &str = "Stand";
}

/// LED colors as `0xRRGGBB`
pub mod color {
    pub const BLUE: u32 = 0x0000_FF;
    pub const WHITE: u32 = 0xFF_FFFF;
}

/// Capabilities the turn protocol depends on
#[async_trait]
pub trait Robot: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Speak text, returning once delivery has finished
    ///
    /// Inline animation tags such as `^start(animations/...)` are passed through.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Move the head to an absolute pose in radians
    async fn move_head(&self, yaw: f64, pitch: f64) -> Result<()>;

    /// Face forward
    async fn center_head(&self) -> Result<()>;

    /// Go to a named posture
    async fn set_posture(&self, name: &str) -> Result<()>;

    /// Rotate the eye LEDs in `color` for `duration`
    async fn set_led_pattern(&self, color: u32, duration: Duration) -> Result<()>;

    /// Run a named behavior (e.g. `animations/Stand/Gestures/Thinking_1`)
    async fn run_behavior(&self, id: &str) -> Result<()>;

    /// Pause or resume the word recognizer
    async fn pause_recognizer(&self, paused: bool) -> Result<()>;

    /// Replace the recognizer vocabulary
    async fn set_vocabulary(&self, words: &[String]) -> Result<()>;

    /// Subscribe to the recognizer so it starts producing words
    async fn subscribe_recognizer(&self, subscriber: &str) -> Result<()>;

    /// Last word reported by the recognizer, if any
    async fn last_recognized_word(&self) -> Result<Option<String>>;
}
