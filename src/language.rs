//! Conversation language selection
//!
//! The backend understands English and Japanese. The language picks the
//! default city used when no location can be inferred, the welcome copy and
//! the translation table loaded from the backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported conversation languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    /// Language code as sent to the backend (query params and form fields)
    pub(crate) fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    /// City used to seed a session when the user's text names no place
    pub(crate) fn default_city(self) -> &'static str {
        match self {
            Language::Ja => "Tokyo",
            Language::En => "New York",
        }
    }

    /// Greeting shown on an empty conversation
    pub(crate) fn welcome(self) -> (&'static str, &'static str) {
        match self {
            Language::Ja => (
                "ようこそ！",
                "天気に基づいたアクティビティ提案を取得するには、メッセージを送信するか音声で話しかけてください。",
            ),
            Language::En => (
                "Welcome!",
                "Send a message or use voice input to get weather-based activity suggestions.",
            ),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "English"),
            Language::Ja => write!(f, "日本語"),
        }
    }
}

/// Error returned when parsing an unknown language code
#[derive(Debug, thiserror::Error)]
#[error("Unsupported language: {0} (expected \"en\" or \"ja\")")]
pub(crate) struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ja" | "japanese" => Ok(Language::Ja),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Localised UI strings keyed by message id
///
/// Lookups for missing keys return the key itself, so the UI stays usable
/// before (or without) a successful load.
#[derive(Debug, Clone, Default)]
pub(crate) struct Translations {
    strings: HashMap<String, String>,
}

impl Translations {
    pub(crate) fn new(strings: HashMap<String, String>) -> Self {
        Self { strings }
    }

    /// Translate a key, falling back to the key
    pub(crate) fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
