use crate::services::parser::ParseMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.moysklad.ru/api/remap/1.2";
pub const DEFAULT_WEB_URL: &str = "https://online.moysklad.ru/app";
pub const DEFAULT_TEMP_DIR: &str = "./temp";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub api_token: String,
    pub api_url: String,
    pub web_url: String,
    /// Organization shown by the status report. Sellers are still resolved by
    /// tax id.
    pub organization_id: Option<String>,
    pub temp_dir: PathBuf,
    pub log_level: String,
    /// Upload size limit in bytes.
    pub max_file_size: u64,
    pub parse_mode: ParseMode,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            organization_id: None,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            parse_mode: ParseMode::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / 1024 / 1024
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
