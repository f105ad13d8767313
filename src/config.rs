//! Layered application configuration
//!
//! Sources, lowest precedence first:
//! 1. `config.toml` embedded at build time
//! 2. the user's `config.toml` (`<config dir>/weather-chat/config.toml`, or `--config`)
//! 3. `WEATHER_CHAT_API_URL` from the environment or a `.env` file
//! 4. command-line flags

use crate::error::ConfigError;
use crate::language::Language;
use crate::orchestrator::BootstrapMode;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Embedded defaults
const DEFAULT_CONFIG_TOML: &str = include_str!("../config.toml");

/// Environment variable overriding the backend URL
pub(crate) const API_URL_ENV: &str = "WEATHER_CHAT_API_URL";

/// Command-line flags
#[derive(Debug, Default, Parser)]
#[command(name = "weather-chat", version, about = "Weather-based activity suggestions, by text or voice")]
pub(crate) struct CliArgs {
    /// Backend base URL (e.g. http://localhost:8000)
    #[arg(long)]
    pub(crate) api_url: Option<String>,

    /// Conversation language: en or ja
    #[arg(long)]
    pub(crate) language: Option<Language>,

    /// Session bootstrap policy: eager-weather or lazy
    #[arg(long)]
    pub(crate) bootstrap: Option<BootstrapMode>,

    /// Path to a config.toml overriding the defaults
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub(crate) api: ApiConfig,
    pub(crate) session: SessionConfig,
    pub(crate) audio: AudioConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiConfig {
    pub(crate) base_url: String,
    pub(crate) request_timeout_secs: u64,
    pub(crate) connect_timeout_secs: u64,
}

impl ApiConfig {
    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Conversation settings
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionConfig {
    pub(crate) language: Language,
    pub(crate) bootstrap_mode: BootstrapMode,
}

/// Microphone capture settings
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AudioConfig {
    /// Sample rate of uploaded recordings in Hz
    #[serde(default = "default_sample_rate")]
    pub(crate) sample_rate: u32,
}

fn default_sample_rate() -> u32 {
    crate::audio::DEFAULT_SAMPLE_RATE
}

/// Default location of the user config file
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("weather-chat").join("config.toml"))
}

impl Config {
    /// Load configuration from every source
    pub(crate) fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut merged = parse_toml("embedded config.toml", DEFAULT_CONFIG_TOML)?;

        let user_path = args.config.clone().or_else(user_config_path);
        if let Some(path) = user_path {
            if let Some(overlay) = read_overlay(&path, args.config.is_some())? {
                info!("Loaded user configuration from {:?}", path);
                merge_tables(&mut merged, overlay);
            }
        }

        let mut config: Config =
            merged
                .try_into()
                .map_err(|source| ConfigError::Parse {
                    source_name: "merged configuration".to_string(),
                    source,
                })?;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api.base_url = url;
            }
        }
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Command-line flags win over every other source
    fn apply_args(&mut self, args: &CliArgs) {
        if let Some(url) = &args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(language) = args.language {
            self.session.language = language;
        }
        if let Some(mode) = args.bootstrap {
            self.session.bootstrap_mode = mode;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.api.base_url.clone(),
            source,
        })?;
        Ok(())
    }
}

fn parse_toml(source_name: &str, contents: &str) -> Result<toml::Table, ConfigError> {
    contents
        .parse::<toml::Table>()
        .map_err(|source| ConfigError::Parse {
            source_name: source_name.to_string(),
            source,
        })
}

/// Read an overlay file. A missing default file is fine; a missing
/// explicitly requested file is an error.
fn read_overlay(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    if !path.exists() {
        if !required {
            return Ok(None);
        }
        warn!("Configuration file {:?} does not exist", path);
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&path.display().to_string(), &contents).map(Some)
}

/// Recursively overlay `overlay` onto `base`
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
