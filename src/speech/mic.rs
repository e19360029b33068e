//! Microphone transcriber: capture, endpoint, transcribe

use std::time::Duration;

use async_trait::async_trait;

use super::Transcriber;
use crate::Result;
use crate::voice::{AudioCapture, SAMPLE_RATE, SpeechToText, UtteranceDetector, samples_to_wav};

/// How often the capture buffer is drained
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Microphone capture settings
#[derive(Debug, Clone)]
pub struct MicSettings {
    /// Input device index (see `parley list-mics`); default device if `None`
    pub device_index: Option<usize>,
    /// Background noise sampled before each utterance
    pub ambient_duration: Duration,
    /// Longest utterance kept
    pub phrase_time_limit: Duration,
}

impl Default for MicSettings {
    fn default() -> Self {
        Self {
            device_index: None,
            ambient_duration: Duration::from_secs(1),
            phrase_time_limit: Duration::from_secs(5),
        }
    }
}

/// Transcriber backed by a microphone and Whisper
pub struct MicTranscriber {
    settings: MicSettings,
    capture: AudioCapture,
    detector: UtteranceDetector,
    stt: SpeechToText,
}

impl MicTranscriber {
    /// Open the microphone
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(settings: MicSettings, stt: SpeechToText) -> Result<Self> {
        let capture = AudioCapture::new(settings.device_index)?;
        let detector = UtteranceDetector::new(settings.phrase_time_limit);

        Ok(Self {
            settings,
            capture,
            detector,
            stt,
        })
    }
}

#[async_trait]
impl Transcriber for MicTranscriber {
    async fn capture_utterance(&mut self) -> Result<Option<String>> {
        self.capture.start().await?;
        self.capture.clear_buffer();
        self.detector.reset();

        tokio::time::sleep(self.settings.ambient_duration).await;
        self.detector.calibrate(&self.capture.take_buffer());

        tracing::info!("listening");
        let utterance = loop {
            tokio::time::sleep(DRAIN_INTERVAL).await;
            let samples = self.capture.take_buffer();
            if let Some(utterance) = self.detector.process(&samples) {
                break utterance;
            }
        };

        // Stop between utterances so the robot's own speech is not captured
        self.capture.stop().await;

        tracing::info!(samples = utterance.len(), "processing");
        let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;
        let text = self.stt.transcribe(&wav).await?;
        let text = text.trim();

        if text.is_empty() {
            tracing::info!("could not understand the audio");
            return Ok(None);
        }

        Ok(Some(text.to_string()))
    }
}
