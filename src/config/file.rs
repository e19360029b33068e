//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::RobotBackend;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfigFile {
    /// Shared state locations
    #[serde(default)]
    pub state: StateFileConfig,

    /// Loop and idle timing
    #[serde(default)]
    pub timing: TimingFileConfig,

    /// Robot-side configuration
    #[serde(default)]
    pub robot: RobotFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech capture configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Conversation history configuration
    #[serde(default)]
    pub history: HistoryFileConfig,
}

/// Shared state file locations
#[derive(Debug, Default, Deserialize)]
pub struct StateFileConfig {
    /// Directory holding the control, response and history files
    pub dir: Option<PathBuf>,
    pub control_file: Option<String>,
    pub response_file: Option<String>,
    pub history_file: Option<String>,
}

/// Timing, all in milliseconds
#[derive(Debug, Default, Deserialize)]
pub struct TimingFileConfig {
    pub poll_interval_ms: Option<u64>,
    pub error_backoff_ms: Option<u64>,
    pub look_back_interval_ms: Option<u64>,
    pub look_away_duration_ms: Option<u64>,
    pub cue_interval_ms: Option<u64>,
    pub cue_pulse_ms: Option<u64>,
}

/// Robot configuration
#[derive(Debug, Default, Deserialize)]
pub struct RobotFileConfig {
    /// "console" or "http"
    pub backend: Option<RobotBackend>,
    /// Bridge base URL for the http backend
    pub bridge_url: Option<String>,
    pub wake_word: Option<String>,
    pub require_wake_word: Option<bool>,
    /// Behavior run while looking away (empty string disables)
    pub thinking_behavior: Option<String>,
    /// Look-away yaw bound in radians
    pub max_yaw: Option<f64>,
    /// Look-away pitch bound in radians
    pub max_pitch: Option<f64>,
}

/// LLM configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4")
    pub model: Option<String>,
    /// API base URL
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
}

/// Speech capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,
    pub phrase_time_limit_ms: Option<u64>,
    pub ambient_ms: Option<u64>,
    /// Input device index
    pub device_index: Option<usize>,
}

/// History configuration
#[derive(Debug, Default, Deserialize)]
pub struct HistoryFileConfig {
    /// Start every front-end session with a fresh history
    pub reset_on_start: Option<bool>,
}

/// Load the TOML config file from `path`, or from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> ParleyConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return ParleyConfigFile::default();
    };

    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ParleyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ParleyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/parley/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let fc: ParleyConfigFile = toml::from_str(
            r#"
            [timing]
            look_back_interval_ms = 3000

            [robot]
            backend = "http"
            bridge_url = "http://10.60.11.4:8080"
            "#,
        )
        .unwrap();

        assert_eq!(fc.timing.look_back_interval_ms, Some(3000));
        assert_eq!(fc.robot.backend, Some(RobotBackend::Http));
        assert!(fc.llm.model.is_none());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(toml::from_str::<ParleyConfigFile>("[bogus]\nx = 1").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let fc = load_config_file(Some(&dir.path().join("absent.toml")));
        assert!(fc.state.dir.is_none());
    }

    #[test]
    fn test_unparsable_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing\npoll_interval_ms = ").unwrap();

        let fc = load_config_file(Some(&path));
        assert!(fc.timing.poll_interval_ms.is_none());
    }
}
