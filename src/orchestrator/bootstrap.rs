//! Session bootstrap and history merge policies

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How the first submit establishes a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BootstrapMode {
    /// Create a session seeded with weather for the place named in the
    /// first message (or the language's default city)
    #[default]
    EagerWeather,
    /// Create an empty session and let the backend fetch weather on demand
    Lazy,
}

/// How an assistant reply is merged into local history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergePolicy {
    /// Append the reply as one new message
    AppendReply,
    /// Replace the history with the server's canonical list
    ReplaceWithServer,
}

impl BootstrapMode {
    pub(crate) fn merge_policy(self) -> MergePolicy {
        match self {
            BootstrapMode::EagerWeather => MergePolicy::AppendReply,
            BootstrapMode::Lazy => MergePolicy::ReplaceWithServer,
        }
    }

    /// Generic message shown when session creation fails without detail
    pub(crate) fn failure_fallback(self) -> &'static str {
        match self {
            BootstrapMode::EagerWeather => "Error fetching weather data",
            BootstrapMode::Lazy => "Error creating session",
        }
    }
}

impl fmt::Display for BootstrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapMode::EagerWeather => write!(f, "eager-weather"),
            BootstrapMode::Lazy => write!(f, "lazy"),
        }
    }
}

/// Error returned when parsing an unknown bootstrap mode
#[derive(Debug, thiserror::Error)]
#[error("Unknown bootstrap mode: {0} (expected \"eager-weather\" or \"lazy\")")]
pub(crate) struct UnknownBootstrapMode(String);

impl FromStr for BootstrapMode {
    type Err = UnknownBootstrapMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eager-weather" | "eager_weather" | "eager" => Ok(BootstrapMode::EagerWeather),
            "lazy" => Ok(BootstrapMode::Lazy),
            other => Err(UnknownBootstrapMode(other.to_string())),
        }
    }
}
