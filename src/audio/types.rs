//! Audio clip types and error definitions

use super::RecordingState;
use std::fmt;
use std::path::{Path, PathBuf};

/// Container format of an audio clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    M4a,
    Ogg,
    Opus,
    Webm,
    /// Anything else, passed through by extension
    Other(String),
}

impl AudioFormat {
    pub(crate) fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "wav" => AudioFormat::Wav,
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "m4a" => AudioFormat::M4a,
            "ogg" => AudioFormat::Ogg,
            "opus" => AudioFormat::Opus,
            "webm" => AudioFormat::Webm,
            other => AudioFormat::Other(other.to_string()),
        }
    }

    pub(crate) fn extension(&self) -> &str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Opus => "opus",
            AudioFormat::Webm => "webm",
            AudioFormat::Other(ext) => ext,
        }
    }

    pub(crate) fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Other(_) => "application/octet-stream",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded audio ready for transcription
///
/// Short-lived: created on stop or file selection, consumed by the
/// transcriber.
#[derive(Clone)]
pub(crate) struct AudioClip {
    pub(crate) bytes: Vec<u8>,
    pub(crate) format: AudioFormat,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

impl AudioClip {
    /// Upload file name, e.g. `audio.wav`
    pub(crate) fn file_name(&self) -> String {
        format!("audio.{}", self.format.extension())
    }

    /// Load a pre-recorded clip; the format comes from the file extension
    pub(crate) async fn from_file(path: &Path) -> Result<Self, AudioCaptureError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| AudioCaptureError::UnknownFileFormat(path.to_path_buf()))?;
        let format = AudioFormat::from_extension(extension);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AudioCaptureError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { bytes, format })
    }
}

/// Errors that can occur during audio capture
#[derive(Debug, thiserror::Error)]
pub(crate) enum AudioCaptureError {
    #[error("No audio input device found")]
    NoInputDevice,

    #[error("Microphone access denied or unavailable: {0}")]
    DeviceAccess(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    StreamError(#[from] cpal::BuildStreamError),

    #[error("Audio play error: {0}")]
    PlayError(#[from] cpal::PlayStreamError),

    #[error("Default config error: {0}")]
    DefaultConfigError(#[from] cpal::DefaultStreamConfigError),

    #[error("Audio input is busy ({0:?})")]
    Busy(RecordingState),

    #[error("Not recording")]
    NotRecording,

    #[error("Capture task ended unexpectedly")]
    CaptureAborted,

    #[error("Failed to encode recording: {0}")]
    Encoding(String),

    #[error("Cannot infer audio format from file name: {0}")]
    UnknownFileFormat(PathBuf),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AudioCaptureError {
    /// Microphone missing, denied or unusable
    pub(crate) fn is_device_access(&self) -> bool {
        matches!(
            self,
            AudioCaptureError::NoInputDevice
                | AudioCaptureError::DeviceAccess(_)
                | AudioCaptureError::UnsupportedFormat(_)
                | AudioCaptureError::StreamError(_)
                | AudioCaptureError::PlayError(_)
                | AudioCaptureError::DefaultConfigError(_)
        )
    }
}

impl From<hound::Error> for AudioCaptureError {
    fn from(e: hound::Error) -> Self {
        AudioCaptureError::Encoding(e.to_string())
    }
}
