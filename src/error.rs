use crate::transcription::TranscriptionError;
use thiserror::Error;

/// Backend request errors
///
/// Every transport failure or non-2xx response is normalised into this
/// type. `detail` is the backend's human-readable explanation, when it sent
/// one.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },
}

impl ApiError {
    /// Backend-provided detail text, if any
    pub(crate) fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Failures of a chat operation, handled at the orchestrator boundary
#[derive(Debug, Error)]
pub(crate) enum ChatError {
    #[error("Failed to create session: {0}")]
    SessionCreation(#[source] ApiError),

    #[error("Failed to get suggestions: {0}")]
    Dispatch(#[source] ApiError),

    #[error("Failed to fetch weather: {0}")]
    WeatherLookup(#[source] ApiError),

    #[error("Failed to transcribe audio: {0}")]
    Transcription(#[from] TranscriptionError),
}

impl ChatError {
    /// Text shown to the user: backend detail verbatim, else a generic line
    pub(crate) fn user_message(&self, fallback: &str) -> String {
        let detail = match self {
            ChatError::SessionCreation(e) | ChatError::Dispatch(e) | ChatError::WeatherLookup(e) => {
                e.detail()
            }
            ChatError::Transcription(e) => e.detail(),
        };
        detail.unwrap_or(fallback).to_string()
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("Invalid configuration in {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backend URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
