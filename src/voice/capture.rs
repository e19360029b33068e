//! Audio capture from microphone
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated thread
//! and samples are handed over through a shared buffer.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};
use tokio::sync::oneshot;

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Thread that owns a non-`Send` resource until told to stop
struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Build a resource on a new thread and hold it there
    ///
    /// Startup is awaited, so a slow device open never stalls the runtime.
    async fn spawn<T, F>(name: &str, build: F) -> Result<Self>
    where
        T: 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || match build() {
                Ok(resource) => {
                    let _ = ready_tx.send(Ok(()));
                    // Hold until stopped or the owner is dropped
                    let _ = stop_rx.recv();
                    drop(resource);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        ready_rx
            .await
            .map_err(|_| Error::Audio("capture thread exited during startup".to_string()))??;

        Ok(Self { stop_tx, handle })
    }

    /// Signal the thread and join it on the blocking pool
    async fn stop(self) {
        let Self { stop_tx, handle } = self;
        let _ = stop_tx.send(());
        if let Err(e) = tokio::task::spawn_blocking(move || handle.join()).await {
            tracing::warn!(error = %e, "failed to join capture thread");
        }
    }
}

/// Captures audio from an input device
pub struct AudioCapture {
    device_index: Option<usize>,
    buffer: Arc<Mutex<Vec<f32>>>,
    worker: Option<Worker>,
}

/// Names of the available input devices, in index order
///
/// # Errors
///
/// Returns error if devices cannot be enumerated
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| Error::Audio(e.to_string()))?;

    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "<unknown>".to_string()))
        .collect())
}

/// Resolve an input device by index, or the default device
fn open_device(index: Option<usize>) -> Result<Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => host
            .input_devices()
            .map_err(|e| Error::Audio(e.to_string()))?
            .nth(i)
            .ok_or_else(|| Error::Audio(format!("no input device with index {i}"))),
        None => host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string())),
    }
}

/// Find a mono 16kHz configuration on `device`
fn speech_config(device: &Device) -> Result<StreamConfig> {
    let supported = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

    Ok(supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config())
}

/// Build and start an input stream that appends into `buffer`
fn build_stream(device_index: Option<usize>, buffer: Arc<Mutex<Vec<f32>>>) -> Result<cpal::Stream> {
    let device = open_device(device_index)?;
    let config = speech_config(&device)?;
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            |err| {
                tracing::error!(error = %err, "audio capture error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;
    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(stream)
}

impl AudioCapture {
    /// Create a capture for the device at `device_index` (default device if `None`)
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened at 16kHz mono
    pub fn new(device_index: Option<usize>) -> Result<Self> {
        let device = open_device(device_index)?;
        let config = speech_config(&device)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device_index,
            buffer: Arc::new(Mutex::new(Vec::new())),
            worker: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be built or started
    pub async fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let device_index = self.device_index;
        let worker =
            Worker::spawn("audio-capture", move || build_stream(device_index, buffer)).await?;

        self.worker = Some(worker);
        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop().await;
            tracing::debug!("audio capture stopped");
        }
    }

    /// Get captured audio buffer and clear it
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        // The thread releases the stream on its own once signalled
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
        }
    }
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Resource that is slow to open and to release
    struct SlowResource(Arc<AtomicBool>);

    impl Drop for SlowResource {
        fn drop(&mut self) {
            std::thread::sleep(Duration::from_millis(100));
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_worker_lifecycle_keeps_runtime_responsive() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let worker = Worker::spawn("test-capture", move || {
            std::thread::sleep(Duration::from_millis(100));
            Ok(SlowResource(flag))
        })
        .await
        .unwrap();

        let after_start = ticks.load(Ordering::SeqCst);
        assert!(after_start > 0, "runtime stalled during startup");

        worker.stop().await;
        assert!(released.load(Ordering::SeqCst));
        assert!(ticks.load(Ordering::SeqCst) > after_start, "runtime stalled during stop");

        ticker.abort();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_worker_startup_error_is_returned() {
        let result = Worker::spawn("test-capture", || -> Result<()> {
            Err(Error::Audio("no input device available".to_string()))
        })
        .await;

        assert!(matches!(result, Err(Error::Audio(msg)) if msg.contains("no input device")));
    }

    #[test]
    fn test_samples_to_wav_header_and_length() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample
        assert_eq!(wav.len(), 44 + samples.len() * 2);

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
    }
}
