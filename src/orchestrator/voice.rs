//! Voice input: microphone or file → transcript → submit

use super::{Notice, SessionOrchestrator};
use crate::audio::{AudioCaptureError, AudioClip};
use crate::chat::Message;
use crate::error::ChatError;
use crate::transcription::TranscriptionError;
use std::path::Path;
use tracing::{info, warn};

/// Shown when transcription fails without backend detail
const TRANSCRIPTION_FALLBACK: &str = "Error transcribing audio";

const MICROPHONE_NOTICE: &str = "Error accessing microphone. Please check permissions.";

const NO_SPEECH_NOTICE: &str = "No speech detected in the audio.";

impl SessionOrchestrator {
    /// Acquire the microphone and start recording
    pub(crate) async fn start_recording(&mut self) -> Option<Notice> {
        match self.capture.start().await {
            Ok(()) => None,
            Err(e) => Some(capture_notice(e)),
        }
    }

    /// Stop recording, transcribe the clip and submit the transcript
    ///
    /// The microphone is released before transcription starts.
    pub(crate) async fn stop_recording(&mut self) -> Option<Notice> {
        let clip = match self.capture.stop().await {
            Ok(clip) => clip,
            Err(e) => return Some(capture_notice(e)),
        };
        self.transcribe_clip(clip).await
    }

    /// Discard an in-progress recording without transcribing it
    pub(crate) fn cancel_recording(&mut self) {
        self.capture.cancel();
    }

    /// Transcribe a pre-recorded audio file and submit the transcript
    pub(crate) async fn transcribe_file(&mut self, path: &Path) -> Option<Notice> {
        if let Err(e) = self.capture.begin_file_transcription() {
            return Some(capture_notice(e));
        }

        match AudioClip::from_file(path).await {
            Ok(clip) => {
                info!(path = %path.display(), format = %clip.format, "Transcribing audio file");
                self.transcribe_clip(clip).await
            }
            Err(e) => {
                self.capture.finish_transcription();
                Some(capture_notice(e))
            }
        }
    }

    /// Runs with the capture controller in `Transcribing`; returns it to
    /// `Idle` before the transcript is submitted
    async fn transcribe_clip(&mut self, clip: AudioClip) -> Option<Notice> {
        let language = self.state.language;
        let result = {
            let _loading = self.state.begin_loading();
            self.transcriber.transcribe(clip, language).await
        };
        self.capture.finish_transcription();

        match result {
            Ok(transcript) => {
                info!(chars = transcript.chars().count(), "Transcription received");
                self.submit(&transcript).await;
                None
            }
            Err(TranscriptionError::EmptyTranscript) => {
                info!("Transcription contained no speech");
                Some(Notice::Info(NO_SPEECH_NOTICE.to_string()))
            }
            Err(e) => {
                let error = ChatError::from(e);
                warn!("{}", error);
                self.history
                    .push(Message::error(error.user_message(TRANSCRIPTION_FALLBACK)));
                None
            }
        }
    }
}

/// Map a capture failure to what the user is told
fn capture_notice(error: AudioCaptureError) -> Notice {
    if error.is_device_access() {
        warn!("Microphone unavailable: {}", error);
        Notice::Blocking(MICROPHONE_NOTICE.to_string())
    } else {
        warn!("Audio input failed: {}", error);
        Notice::Info(error.to_string())
    }
}
