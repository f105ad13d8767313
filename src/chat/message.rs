//! Chat message and weather snapshot types

use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    User,
    Assistant,
}

/// How a message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MessageKind {
    #[default]
    Text,
    Weather,
    Error,
}

/// A weather reading for one place at one point in time
///
/// Values arrive pre-formatted from the backend (e.g. `"21.0°C / 69.8°F"`).
/// Snapshots are never edited; a fresher reading replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WeatherSnapshot {
    pub(crate) location: String,
    pub(crate) condition: String,
    #[serde(default)]
    pub(crate) icon: String,
    pub(crate) temperature: String,
    pub(crate) feels_like: String,
    pub(crate) humidity: String,
    pub(crate) wind: String,
    pub(crate) uv_index: f64,
    pub(crate) precipitation: String,
    pub(crate) visibility: String,
    pub(crate) local_time: String,
}

/// One entry of the conversation
///
/// Server-side history entries only carry `role` and `content`; the other
/// fields default to a plain text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Message {
    pub(crate) role: Role,
    pub(crate) content: String,
    #[serde(default, alias = "type")]
    pub(crate) kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) weather: Option<WeatherSnapshot>,
}

impl Message {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: MessageKind::Text,
            weather: None,
        }
    }

    pub(crate) fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Text,
            weather: None,
        }
    }

    pub(crate) fn error(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Error,
            weather: None,
        }
    }

    /// Weather card announcing a snapshot
    pub(crate) fn weather(content: impl Into<String>, snapshot: WeatherSnapshot) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Weather,
            weather: Some(snapshot),
        }
    }

    /// Same author and text, ignoring presentation extras
    pub(crate) fn same_utterance(&self, other: &Message) -> bool {
        self.role == other.role && self.content == other.content
    }
}

#[cfg(test)]
pub(crate) fn sample_snapshot(location: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location: location.to_string(),
        condition: "Partly cloudy".to_string(),
        icon: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
        temperature: "21.0°C / 69.8°F".to_string(),
        feels_like: "21.0°C".to_string(),
        humidity: "60%".to_string(),
        wind: "11.2 km/h NNE".to_string(),
        uv_index: 5.0,
        precipitation: "0.0 mm".to_string(),
        visibility: "10.0 km".to_string(),
        local_time: "2026-10-16 14:30".to_string(),
    }
}
