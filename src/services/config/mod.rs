//! Environment-driven configuration.

pub mod models;

pub use models::*;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Failed to load .env: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = AppConfig::default();

        let max_file_size = match get("MAX_FILE_SIZE") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_FILE_SIZE",
                value: raw,
            })?,
            None => defaults.max_file_size,
        };

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECS",
                value: raw,
            })?,
            None => defaults.http_timeout_secs,
        };

        let parse_mode = match get("UPD_PARSE_MODE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "UPD_PARSE_MODE",
                value: raw,
            })?,
            None => defaults.parse_mode,
        };

        Ok(Self {
            api_token: get("MOYSKLAD_API_TOKEN").unwrap_or_default(),
            api_url: get("MOYSKLAD_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            web_url: get("MOYSKLAD_WEB_URL").unwrap_or(defaults.web_url),
            organization_id: get("MOYSKLAD_ORGANIZATION_ID"),
            temp_dir: get("TEMP_DIR").map(PathBuf::from).unwrap_or(defaults.temp_dir),
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            max_file_size,
            parse_mode,
            http_timeout_secs,
        })
    }

    /// Human-readable problems; empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.api_token.is_empty() {
            problems.push("MOYSKLAD_API_TOKEN не установлен".to_string());
        }
        if self.max_file_size == 0 {
            problems.push("MAX_FILE_SIZE должен быть больше нуля".to_string());
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            problems.push(format!("MOYSKLAD_API_URL не является URL: {}", self.api_url));
        }
        problems
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
