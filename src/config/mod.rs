//! Configuration management for the Parley gateway
//!
//! Precedence: environment > TOML file > defaults.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::controller::ControllerSettings;
use crate::history::HISTORY_FILE;
use crate::idle::IdleConfig;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::poll::PollConfig;
use crate::speech::MicSettings;
use crate::store::{CONTROL_FILE, FileStore, RESPONSE_FILE};
use crate::{Error, Result};

use file::ParleyConfigFile;

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "Hey Dave";

/// Default STT model
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Default system prompt for a fresh history
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Dave, a friendly humanoid robot talking with a \
patient who may have no medical background. Answer clearly and briefly, in plain words, and \
invite follow-up questions. You may add a gesture between sentences using the form \
^start(animations/Stand/Gestures/Hey_1). Start by asking for the person's name. Keep every \
reply under 200 words.";

/// Robot backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RobotBackend {
    /// Log robot actions instead of performing them
    #[default]
    Console,
    /// Drive a robot through an HTTP bridge
    Http,
}

/// Parley configuration
#[derive(Debug)]
pub struct Config {
    /// Shared state locations
    pub state: StateConfig,

    /// Poll loop pacing
    pub poll: PollConfig,

    /// Idle behavior timing
    pub idle: IdleConfig,

    /// Robot-side settings
    pub robot: RobotConfig,

    /// LLM settings
    pub llm: LlmConfig,

    /// Speech capture settings
    pub speech: SpeechConfig,

    /// Reset history when the front-end starts
    pub reset_history_on_start: bool,
}

/// Shared state locations
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub dir: PathBuf,
    pub control_file: String,
    pub response_file: String,
    pub history_file: String,
}

impl StateConfig {
    /// Open the shared state store
    ///
    /// # Errors
    ///
    /// Returns error if the state directory cannot be prepared
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open_with_names(&self.dir, &self.control_file, &self.response_file)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.dir.join(&self.history_file)
    }
}

/// Robot-side settings
#[derive(Debug, Clone)]
pub struct RobotConfig {
    pub backend: RobotBackend,
    pub bridge_url: Option<String>,
    pub controller: ControllerSettings,
}

/// LLM settings
#[derive(Debug)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    pub api_key: Option<SecretString>,
}

/// Speech capture settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub stt_model: String,
    pub mic: MicSettings,
}

/// Default state directory: `~/.local/share/parley` on Linux
#[must_use]
pub fn default_state_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".parley"),
        |d| d.data_dir().join("parley"),
    )
}

fn env_millis(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    env(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{key}: {e}")))
        })
        .transpose()
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if an environment override is malformed
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups and defaults
    ///
    /// # Errors
    ///
    /// Returns error if an environment override is malformed, a timing
    /// value is zero where a positive value is required, or the head range
    /// is not finite
    pub fn resolve(fc: ParleyConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let state = StateConfig {
            dir: env("PARLEY_STATE_DIR")
                .map(PathBuf::from)
                .or(fc.state.dir)
                .unwrap_or_else(default_state_dir),
            control_file: fc
                .state
                .control_file
                .unwrap_or_else(|| CONTROL_FILE.to_string()),
            response_file: fc
                .state
                .response_file
                .unwrap_or_else(|| RESPONSE_FILE.to_string()),
            history_file: fc.state.history_file.unwrap_or_else(|| HISTORY_FILE.to_string()),
        };

        let defaults = PollConfig::default();
        let poll = PollConfig {
            interval: env_millis(&env, "PARLEY_POLL_INTERVAL_MS")?
                .or(fc.timing.poll_interval_ms)
                .map_or(defaults.interval, Duration::from_millis),
            error_backoff: fc
                .timing
                .error_backoff_ms
                .map_or(defaults.error_backoff, Duration::from_millis),
        };
        if poll.interval.is_zero() {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }
        if poll.error_backoff.is_zero() {
            return Err(Error::Config("error backoff must be positive".to_string()));
        }

        let idle_defaults = IdleConfig::default();
        let idle = IdleConfig {
            look_back_interval: fc
                .timing
                .look_back_interval_ms
                .map_or(idle_defaults.look_back_interval, Duration::from_millis),
            look_away_duration: fc
                .timing
                .look_away_duration_ms
                .map_or(idle_defaults.look_away_duration, Duration::from_millis),
            max_yaw: fc.robot.max_yaw.unwrap_or(idle_defaults.max_yaw).abs(),
            max_pitch: fc.robot.max_pitch.unwrap_or(idle_defaults.max_pitch).abs(),
            thinking_behavior: match fc.robot.thinking_behavior {
                Some(b) if b.is_empty() => None,
                Some(b) => Some(b),
                None => idle_defaults.thinking_behavior,
            },
            cue_interval: fc
                .timing
                .cue_interval_ms
                .map_or(idle_defaults.cue_interval, Duration::from_millis),
            cue_pulse: fc
                .timing
                .cue_pulse_ms
                .map_or(idle_defaults.cue_pulse, Duration::from_millis),
        };
        if idle.look_back_interval.is_zero() {
            return Err(Error::Config("look-back interval must be positive".to_string()));
        }
        if !idle.max_yaw.is_finite() || !idle.max_pitch.is_finite() {
            return Err(Error::Config("head range must be a finite number".to_string()));
        }

        let robot = RobotConfig {
            backend: fc.robot.backend.unwrap_or_default(),
            bridge_url: env("PARLEY_ROBOT_URL").or(fc.robot.bridge_url),
            controller: ControllerSettings {
                wake_word: env("PARLEY_WAKE_WORD")
                    .or(fc.robot.wake_word)
                    .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string()),
                require_wake_word: fc.robot.require_wake_word.unwrap_or(true),
            },
        };

        let llm = LlmConfig {
            model: env("PARLEY_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: fc.llm.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            system_prompt: fc
                .llm
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            api_key: env("OPENAI_API_KEY")
                .or(fc.llm.api_key)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        let mic_defaults = MicSettings::default();
        let speech = SpeechConfig {
            stt_model: fc
                .speech
                .stt_model
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            mic: MicSettings {
                device_index: fc.speech.device_index,
                ambient_duration: fc
                    .speech
                    .ambient_ms
                    .map_or(mic_defaults.ambient_duration, Duration::from_millis),
                phrase_time_limit: fc
                    .speech
                    .phrase_time_limit_ms
                    .map_or(mic_defaults.phrase_time_limit, Duration::from_millis),
            },
        };

        Ok(Self {
            state,
            poll,
            idle,
            robot,
            llm,
            speech,
            reset_history_on_start: fc.history.reset_on_start.unwrap_or(true),
        })
    }
}
