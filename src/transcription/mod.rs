//! Speech-to-text client
//!
//! Uploads an audio clip to the backend's `/api/transcribe` endpoint as a
//! multipart form and returns the recognised text.

mod error;
#[cfg(test)]
pub(crate) mod mock;

pub(crate) use error::TranscriptionError;

use crate::api::{self, Backend};
use crate::audio::AudioClip;
use crate::error::ApiError;
use crate::language::Language;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Turns audio clips into text
#[async_trait]
pub(crate) trait Transcriber: Send + Sync {
    /// Transcribe a clip. The clip is consumed whatever the outcome.
    async fn transcribe(
        &self,
        clip: AudioClip,
        language: Language,
    ) -> Result<String, TranscriptionError>;
}

/// Response of `/api/transcribe`
#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    success: bool,
    #[serde(default)]
    transcript: Option<String>,
}

impl TranscribeResponse {
    /// Non-empty transcript, or `EmptyTranscript`
    fn into_text(self) -> Result<String, TranscriptionError> {
        match self.transcript {
            Some(text) if self.success && !text.trim().is_empty() => Ok(text),
            _ => Err(TranscriptionError::EmptyTranscript),
        }
    }
}

/// HTTP implementation of [`Transcriber`]
pub(crate) struct TranscriptionClient {
    backend: Backend,
}

impl TranscriptionClient {
    pub(crate) fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    #[instrument(skip(self, clip), fields(format = %clip.format, bytes = clip.bytes.len()))]
    async fn transcribe(
        &self,
        clip: AudioClip,
        language: Language,
    ) -> Result<String, TranscriptionError> {
        let url = self.backend.endpoint(&["api", "transcribe"])?;

        let file_name = clip.file_name();
        let part = Part::bytes(clip.bytes)
            .file_name(file_name)
            .mime_str(clip.format.mime_type())
            .map_err(ApiError::from)?;
        let form = Form::new()
            .part("file", part)
            .text("language", language.code());

        let response = self
            .backend
            .http()
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from)?;
        let body: TranscribeResponse = api::decode_json(response).await?;

        match body.into_text() {
            Ok(text) => {
                info!(chars = text.len(), "Transcription complete");
                Ok(text)
            }
            Err(e) => {
                warn!("Transcription returned no speech");
                Err(e)
            }
        }
    }
}
