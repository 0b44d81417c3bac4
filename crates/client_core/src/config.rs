use std::{collections::HashMap, path::Path, time::Duration};

use config::{Config, Environment, File};
use serde::Deserialize;
use shared::protocol::DEFAULT_HISTORY_LIMIT;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SETTINGS_FILE: &str = "doorbell";
pub const API_KEY_ENV: &str = "DOORBELL_API_KEY";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid base_url '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("base_url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("history_page_size must be greater than zero")]
    ZeroPageSize,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSettings {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    history_page_size: u32,
}

/// Connection settings for one doorbell service.
#[derive(Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub history_page_size: u32,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("history_page_size", &self.history_page_size)
            .finish()
    }
}

impl ClientSettings {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.filter(|key| !key.is_empty()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_page_size: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// `base_url` without a trailing slash, ready for `format!("{}{path}")`.
    pub fn origin(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// Loads settings from defaults, then `doorbell.toml` (or `path`), then `APP__*` variables
/// and `DOORBELL_API_KEY`.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    load_settings_with_env(path, None, std::env::var(API_KEY_ENV).ok())
}

/// Same as [`load_settings`], with the environment supplied by the caller.
///
/// `env` replaces the process environment for the `APP__*` layer when given.
pub fn load_settings_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
    api_key_override: Option<String>,
) -> Result<ClientSettings, SettingsError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
    };

    let raw: RawSettings = Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
        .set_default("history_page_size", i64::from(DEFAULT_HISTORY_LIMIT))?
        .add_source(file)
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .source(env),
        )
        .set_override_option("api_key", api_key_override)?
        .build()?
        .try_deserialize()?;

    if raw.timeout_secs == 0 {
        return Err(SettingsError::ZeroTimeout);
    }
    if raw.history_page_size == 0 {
        return Err(SettingsError::ZeroPageSize);
    }

    Ok(ClientSettings {
        base_url: parse_base_url(&raw.base_url)?,
        api_key: raw.api_key.filter(|key| !key.is_empty()),
        timeout: Duration::from_secs(raw.timeout_secs),
        history_page_size: raw.history_page_size,
    })
}

fn parse_base_url(raw: &str) -> Result<Url, SettingsError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|source| SettingsError::InvalidBaseUrl {
        value: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SettingsError::UnsupportedScheme(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
