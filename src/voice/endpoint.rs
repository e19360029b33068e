//! Utterance endpointing
//!
//! Splits a live sample stream into one utterance: wait for energy above the
//! calibrated threshold, accumulate, and stop on trailing silence or when the
//! phrase time limit is reached.

use std::time::Duration;

use super::SAMPLE_RATE;

/// Lowest threshold ever used, even in a silent room
const ENERGY_FLOOR: f32 = 0.02;

/// Calibrated threshold = ambient RMS times this factor
const AMBIENT_FACTOR: f32 = 3.0;

/// Minimum duration of speech to keep (0.3 seconds)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.8 seconds)
const PAUSE_SAMPLES: usize = 12800;

/// State of the endpoint detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Speaking,
}

/// Energy-based utterance detector
pub struct UtteranceDetector {
    threshold: f32,
    max_samples: usize,
    state: EndpointState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl UtteranceDetector {
    /// Create a detector that cuts utterances at `phrase_limit`
    #[must_use]
    pub fn new(phrase_limit: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_samples = (phrase_limit.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize;

        Self {
            threshold: ENERGY_FLOOR,
            max_samples,
            state: EndpointState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Adjust the speech threshold to the room's background noise
    pub fn calibrate(&mut self, ambient: &[f32]) {
        let energy = calculate_energy(ambient);
        self.threshold = (energy * AMBIENT_FACTOR).max(ENERGY_FLOOR);
        tracing::debug!(
            ambient = energy,
            threshold = self.threshold,
            "calibrated for ambient noise"
        );
    }

    /// Feed samples; returns the utterance once it is complete
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            EndpointState::Idle => {
                if is_speech {
                    self.state = EndpointState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            EndpointState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                let paused = self.silence_counter > PAUSE_SAMPLES;
                let limit_hit = self.speech_buffer.len() >= self.max_samples;

                if paused && self.speech_buffer.len() <= MIN_SPEECH_SAMPLES + self.silence_counter {
                    tracing::trace!("too short, discarding");
                    self.reset();
                    return None;
                }

                if paused || limit_hit {
                    tracing::debug!(
                        samples = self.speech_buffer.len(),
                        limit_hit,
                        "utterance complete"
                    );
                    self.state = EndpointState::Idle;
                    self.silence_counter = 0;
                    let mut utterance = std::mem::take(&mut self.speech_buffer);
                    utterance.truncate(self.max_samples);
                    return Some(utterance);
                }

                None
            }
        }
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = EndpointState::Idle;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    #[must_use]
    pub const fn state(&self) -> EndpointState {
        self.state
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
