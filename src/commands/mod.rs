//! Boundary operations driven by the CLI.

pub mod status;
pub mod upload;

use crate::services::config::AppConfig;
use crate::services::moysklad::HttpAccountingApi;
use crate::services::processor::UpdProcessor;
use crate::types::errors::{CommandError, CommandResult};
use std::sync::Arc;

/// Validate the config and wire the HTTP client into a shared processor.
pub fn build_processor(config: AppConfig) -> CommandResult<Arc<UpdProcessor>> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(CommandError::Config(problems.join("; ")));
    }

    let api = HttpAccountingApi::new(&config.api_url, &config.api_token, config.http_timeout())
        .map_err(|e| CommandError::Config(e.to_string()))?;
    Ok(Arc::new(UpdProcessor::new(config, Arc::new(api))))
}
