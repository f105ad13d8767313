//! Scripted transcriber for tests

use super::{Transcriber, TranscriptionError};
use crate::audio::{AudioClip, AudioFormat};
use crate::error::ApiError;
use crate::language::Language;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted outcome of one transcription
pub(crate) enum Outcome {
    Text(String),
    NoSpeech,
    ServiceError(Option<String>),
}

/// Transcriber returning scripted outcomes in order
#[derive(Default)]
pub(crate) struct MockTranscriber {
    outcomes: Mutex<VecDeque<Outcome>>,
    received: Mutex<Vec<(AudioFormat, usize, Language)>>,
}

impl MockTranscriber {
    pub(crate) fn with(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Format, byte length and language of every clip received
    pub(crate) fn received(&self) -> Vec<(AudioFormat, usize, Language)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        clip: AudioClip,
        language: Language,
    ) -> Result<String, TranscriptionError> {
        self.received
            .lock()
            .unwrap()
            .push((clip.format.clone(), clip.bytes.len(), language));
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Text(text)) => Ok(text),
            Some(Outcome::NoSpeech) | None => Err(TranscriptionError::EmptyTranscript),
            Some(Outcome::ServiceError(detail)) => Err(TranscriptionError::Service(
                ApiError::Server { status: 500, detail },
            )),
        }
    }
}
