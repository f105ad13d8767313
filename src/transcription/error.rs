//! Error types for transcription module

use crate::error::ApiError;

/// Errors that can occur during transcription
#[derive(Debug, thiserror::Error)]
pub(crate) enum TranscriptionError {
    /// The service heard no speech in the clip
    #[error("No speech detected in the audio")]
    EmptyTranscript,

    #[error("Transcription service error: {0}")]
    Service(#[from] ApiError),
}

impl TranscriptionError {
    /// Backend-provided detail text, if any
    pub(crate) fn detail(&self) -> Option<&str> {
        match self {
            TranscriptionError::Service(e) => e.detail(),
            TranscriptionError::EmptyTranscript => None,
        }
    }
}
