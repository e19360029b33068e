//! Voice processing module
//!
//! Microphone capture, utterance endpointing and speech-to-text for the
//! front-end.

mod capture;
mod endpoint;
mod stt;

pub use capture::{AudioCapture, SAMPLE_RATE, list_input_devices, samples_to_wav};
pub use endpoint::{EndpointState, UtteranceDetector, calculate_energy};
pub use stt::SpeechToText;
