//! Wire types for the conversation endpoints

use crate::chat::{Message, WeatherSnapshot};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque server-issued session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct SessionId(String);

impl SessionId {
    #[cfg(test)]
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the weather lookups (`/api/weather`, `/api/weather-with-suggestions`)
#[derive(Debug, Serialize)]
pub(super) struct WeatherRequest<'a> {
    pub(super) location: &'a str,
}

/// Session created together with a weather snapshot
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WeatherSession {
    pub(crate) session_id: SessionId,
    pub(crate) weather: WeatherSnapshot,
}

/// Response of `/api/session/create`
#[derive(Debug, Deserialize)]
pub(super) struct CreateSessionResponse {
    pub(super) session_id: SessionId,
}

/// Body of `/api/suggestions`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SuggestionRequest {
    pub(crate) session_id: SessionId,
    pub(crate) query: String,
    pub(crate) language: Language,
}

/// Response of `/api/suggestions`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SuggestionResponse {
    pub(crate) suggestion: String,
    #[serde(default)]
    pub(crate) weather_updated: bool,
    #[serde(default)]
    pub(crate) weather: Option<WeatherSnapshot>,
    #[serde(default)]
    pub(crate) chat_history: Option<Vec<Message>>,
}

impl SuggestionResponse {
    /// Snapshot to apply, only when the backend flagged a refresh
    pub(crate) fn refreshed_weather(&self) -> Option<&WeatherSnapshot> {
        if self.weather_updated {
            self.weather.as_ref()
        } else {
            None
        }
    }
}

/// Response of `/api/examples/{language}`
#[derive(Debug, Deserialize)]
pub(super) struct ExamplesResponse {
    pub(super) examples: Vec<String>,
}
