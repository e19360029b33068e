//! Idle behavior scheduler
//!
//! Keeps the robot looking alive while the peer process is busy. Runs one
//! bounded slice of work per poll tick:
//!
//! - a wait cue (eye LED pulse) at a lower frequency than the tick, colored
//!   by what the controller is waiting for
//! - every `look_back_interval`, a look-away to a random head pose held for
//!   `look_away_duration`, then back to center
//!
//! The longest a tick can take is one look-away hold, so the poll loop stays
//! responsive.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::Result;
use crate::robot::{Robot, color};

/// Why the controller is waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCue {
    /// Turn is `listen`: the front-end is capturing and thinking
    AwaitingTurn,
    /// Turn is `respond` but the payload is not ready yet
    AwaitingResponse,
}

impl WaitCue {
    /// Eye color shown for this wait reason
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::AwaitingTurn => color::BLUE,
            Self::AwaitingResponse => color::WHITE,
        }
    }
}

/// Timing and range settings for idle behavior
#[derive(Debug, Clone)]
pub struct IdleConfig {
    /// Time between look-aways, measured from the previous trigger
    pub look_back_interval: Duration,
    /// How long each look-away is held
    pub look_away_duration: Duration,
    /// Yaw is drawn uniformly from `[-max_yaw, max_yaw]` radians
    pub max_yaw: f64,
    /// Pitch is drawn uniformly from `[-max_pitch, max_pitch]` radians
    pub max_pitch: f64,
    /// Behavior run while looking away
    pub thinking_behavior: Option<String>,
    /// Minimum time between LED pulses for the same wait reason
    pub cue_interval: Duration,
    /// Length of each LED pulse
    pub cue_pulse: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            look_back_interval: Duration::from_secs(4),
            look_away_duration: Duration::from_secs(2),
            max_yaw: 1.0,
            max_pitch: 0.3,
            thinking_behavior: Some("animations/Stand/Gestures/Thinking_1".to_string()),
            cue_interval: Duration::from_secs(1),
            cue_pulse: Duration::from_millis(500),
        }
    }
}

/// Where the head is pointing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadPose {
    Centered,
    Away { yaw: f64, pitch: f64 },
}

/// Gaze context owned by the scheduler
#[derive(Debug, Clone)]
pub struct GazeState {
    pub pose: HeadPose,
    pub last_look_away: Instant,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IdleTick {
    /// An LED pulse was issued
    pub cue_pulsed: bool,
    /// A look-away ran, with the chosen pose
    pub look_away: Option<(f64, f64)>,
}

/// Time-sliced idle animation driver
pub struct IdleScheduler {
    config: IdleConfig,
    gaze: GazeState,
    last_cue: Option<(WaitCue, Instant)>,
    rng: StdRng,
}

impl IdleScheduler {
    /// Create a scheduler; the look-away timer starts now
    #[must_use]
    pub fn new(config: IdleConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a scheduler with a specific random source
    #[must_use]
    pub fn with_rng(config: IdleConfig, rng: StdRng) -> Self {
        Self {
            config,
            gaze: GazeState {
                pose: HeadPose::Centered,
                last_look_away: Instant::now(),
            },
            last_cue: None,
            rng,
        }
    }

    /// Re-arm the look-away timer and forget the last cue
    pub fn reset(&mut self) {
        self.gaze.last_look_away = Instant::now();
        self.last_cue = None;
    }

    #[must_use]
    pub const fn gaze(&self) -> &GazeState {
        &self.gaze
    }

    #[must_use]
    pub const fn config(&self) -> &IdleConfig {
        &self.config
    }

    /// Run one slice of idle behavior
    ///
    /// # Errors
    ///
    /// Returns error if a robot capability call fails
    pub async fn tick(&mut self, robot: &dyn Robot, cue: WaitCue) -> Result<IdleTick> {
        let mut outcome = IdleTick::default();
        let now = Instant::now();

        let cue_due = match self.last_cue {
            Some((last, at)) => last != cue || now.duration_since(at) >= self.config.cue_interval,
            None => true,
        };
        if cue_due {
            self.last_cue = Some((cue, now));
            robot.set_led_pattern(cue.color(), self.config.cue_pulse).await?;
            outcome.cue_pulsed = true;
        }

        if now.duration_since(self.gaze.last_look_away) >= self.config.look_back_interval {
            // Timer runs from the trigger, not from the end of the hold
            self.gaze.last_look_away = now;
            outcome.look_away = Some(self.look_away(robot).await?);
        }

        Ok(outcome)
    }

    async fn look_away(&mut self, robot: &dyn Robot) -> Result<(f64, f64)> {
        let yaw = self.rng.gen_range(-self.config.max_yaw..=self.config.max_yaw);
        let pitch = self.rng.gen_range(-self.config.max_pitch..=self.config.max_pitch);

        tracing::debug!(yaw, pitch, "looking away");
        robot.move_head(yaw, pitch).await?;
        self.gaze.pose = HeadPose::Away { yaw, pitch };

        if let Some(behavior) = &self.config.thinking_behavior {
            robot.run_behavior(behavior).await?;
        }

        tokio::time::sleep(self.config.look_away_duration).await;

        robot.center_head().await?;
        self.gaze.pose = HeadPose::Centered;
        tracing::debug!("looking back");

        Ok((yaw, pitch))
    }
}
