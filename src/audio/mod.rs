//! Microphone capture and recording state
//!
//! [`AudioCaptureController`] owns the recording state machine
//! (Idle → Recording → Transcribing → Idle). Capture runs on a dedicated
//! thread which opens the device, keeps it open while recording and drops
//! it before handing the samples back, so the microphone is released
//! whenever recording stops, fails or is cancelled.

mod resampler;
mod source;
mod types;

pub(crate) use source::{AudioSource, CpalMicrophone};
pub(crate) use types::{AudioCaptureError, AudioClip, AudioFormat};

#[cfg(test)]
pub(crate) use source::fake::FakeMicrophone;

use source::SampleSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Sample rate of recorded clips sent for transcription
pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// How often the capture thread checks the stop flag
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Voice input state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RecordingState {
    #[default]
    Idle,
    Recording,
    Transcribing,
}

/// Samples handed back by the capture thread after the device is released
struct CapturedAudio {
    samples: Vec<i16>,
    sample_rate: u32,
}

/// Handle to a running capture thread
///
/// Dropping the handle stops capture and waits for the thread, which
/// releases the device.
struct CaptureHandle {
    is_capturing: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    captured_rx: Option<oneshot::Receiver<CapturedAudio>>,
}

impl CaptureHandle {
    /// Spawn the capture thread; the returned receiver reports whether the
    /// device could be opened
    fn spawn(
        source: Arc<dyn AudioSource>,
    ) -> (Self, oneshot::Receiver<Result<(), AudioCaptureError>>) {
        let is_capturing = Arc::new(AtomicBool::new(true));
        let is_capturing_clone = is_capturing.clone();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (captured_tx, captured_rx) = oneshot::channel();

        let thread_handle = thread::spawn(move || {
            let sink = SampleSink::default();
            let device = match source.open(sink.clone()) {
                Ok(device) => {
                    let _ = ready_tx.send(Ok(()));
                    device
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while is_capturing_clone.load(Ordering::SeqCst) {
                thread::sleep(STOP_POLL_INTERVAL);
            }

            let sample_rate = device.sample_rate;
            drop(device);
            info!("Microphone released");

            let _ = captured_tx.send(CapturedAudio {
                samples: sink.take(),
                sample_rate,
            });
        });

        let handle = Self {
            is_capturing,
            thread_handle: Some(thread_handle),
            captured_rx: Some(captured_rx),
        };
        (handle, ready_rx)
    }

    /// Stop capturing and collect the samples without blocking the runtime
    ///
    /// The samples arrive once the device is dropped; the thread join that
    /// follows runs on the blocking pool.
    async fn finish(mut self) -> Result<CapturedAudio, AudioCaptureError> {
        self.is_capturing.store(false, Ordering::SeqCst);
        let captured_rx = self
            .captured_rx
            .take()
            .ok_or(AudioCaptureError::CaptureAborted)?;
        let thread_handle = self.thread_handle.take();

        let captured = captured_rx
            .await
            .map_err(|_| AudioCaptureError::CaptureAborted);
        if let Some(handle) = thread_handle {
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => {}
                _ => error!("Audio capture thread panicked"),
            }
        }
        captured
    }

    /// Stop capturing and wait for the thread to finish
    fn stop(&mut self) {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                error!("Audio capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drives microphone capture and tracks [`RecordingState`]
pub(crate) struct AudioCaptureController {
    source: Arc<dyn AudioSource>,
    target_sample_rate: u32,
    state: RecordingState,
    capture: Option<CaptureHandle>,
}

impl AudioCaptureController {
    pub(crate) fn new(source: Arc<dyn AudioSource>, target_sample_rate: u32) -> Self {
        Self {
            source,
            target_sample_rate,
            state: RecordingState::Idle,
            capture: None,
        }
    }

    pub(crate) fn state(&self) -> RecordingState {
        self.state
    }

    /// Acquire the microphone and begin buffering audio
    ///
    /// On failure the state stays `Idle` and no device is held.
    pub(crate) async fn start(&mut self) -> Result<(), AudioCaptureError> {
        if self.state != RecordingState::Idle {
            return Err(AudioCaptureError::Busy(self.state));
        }

        let (capture, ready_rx) = CaptureHandle::spawn(self.source.clone());
        match ready_rx.await {
            Ok(Ok(())) => {
                self.capture = Some(capture);
                self.state = RecordingState::Recording;
                info!("Recording started");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Failed to open microphone: {}", e);
                Err(e)
            }
            Err(_) => Err(AudioCaptureError::CaptureAborted),
        }
    }

    /// Stop recording, release the microphone and return the clip
    ///
    /// On success the state becomes `Transcribing`; the caller hands the
    /// clip to a transcriber and then calls [`Self::finish_transcription`].
    pub(crate) async fn stop(&mut self) -> Result<AudioClip, AudioCaptureError> {
        if self.state != RecordingState::Recording {
            return Err(AudioCaptureError::NotRecording);
        }
        self.state = RecordingState::Idle;
        let capture = self.capture.take().ok_or(AudioCaptureError::NotRecording)?;

        let captured = capture.finish().await?;
        info!(
            samples = captured.samples.len(),
            sample_rate = captured.sample_rate,
            "Recording stopped"
        );

        let target_sample_rate = self.target_sample_rate;
        let clip = tokio::task::spawn_blocking(move || encode_clip(captured, target_sample_rate))
            .await
            .map_err(|_| AudioCaptureError::CaptureAborted)??;

        self.state = RecordingState::Transcribing;
        Ok(clip)
    }

    /// Discard the current recording and release the microphone
    pub(crate) fn cancel(&mut self) {
        if let Some(capture) = self.capture.take() {
            drop(capture);
            info!("Recording cancelled");
        }
        if self.state == RecordingState::Recording {
            self.state = RecordingState::Idle;
        }
    }

    /// Mark a pre-recorded file as being transcribed
    pub(crate) fn begin_file_transcription(&mut self) -> Result<(), AudioCaptureError> {
        if self.state != RecordingState::Idle {
            return Err(AudioCaptureError::Busy(self.state));
        }
        self.state = RecordingState::Transcribing;
        Ok(())
    }

    /// Return to `Idle` once transcription has completed or failed
    pub(crate) fn finish_transcription(&mut self) {
        if self.state == RecordingState::Transcribing {
            self.state = RecordingState::Idle;
        }
    }
}

/// Resample to the target rate and wrap as WAV
fn encode_clip(
    captured: CapturedAudio,
    target_sample_rate: u32,
) -> Result<AudioClip, AudioCaptureError> {
    let samples = resampler::resample(&captured.samples, captured.sample_rate, target_sample_rate)?;
    let bytes = resampler::encode_wav(&samples, target_sample_rate)?;
    Ok(AudioClip {
        bytes,
        format: AudioFormat::Wav,
    })
}
