use crate::services::diagnostics::StatusReport;
use crate::services::processor::UpdProcessor;
use crate::services::report::{status_failure_message, status_message};
use crate::types::context::RequestContext;
use crate::types::errors::{CommandError, CommandResult};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub message: String,
    pub report: Option<StatusReport>,
}

pub async fn check_status(processor: Arc<UpdProcessor>) -> CommandResult<StatusResponse> {
    tokio::task::spawn_blocking(move || {
        let ctx = RequestContext::new();
        match processor.status(&ctx) {
            Ok(report) => StatusResponse {
                ok: true,
                message: status_message(&report),
                report: Some(report),
            },
            Err(error) => {
                log::warn!("[{}] Status check failed: {}", ctx.id(), error);
                StatusResponse {
                    ok: false,
                    message: status_failure_message(&error),
                    report: None,
                }
            }
        }
    })
    .await
    .map_err(|e| CommandError::Internal(format!("Status worker failed: {e}")))
}
