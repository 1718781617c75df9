use crate::services::processor::UpdProcessor;
use crate::types::errors::{CommandError, CommandResult};
use crate::types::outcome::ProcessingOutcome;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub async fn from_path(path: &Path) -> CommandResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CommandError::Io(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Process uploads concurrently, one blocking task each. Outcomes come back
/// in input order; a failed upload never affects the others.
pub async fn process_uploads(
    processor: Arc<UpdProcessor>,
    uploads: Vec<Upload>,
) -> CommandResult<Vec<ProcessingOutcome>> {
    let handles: Vec<_> = uploads
        .into_iter()
        .map(|upload| {
            let processor = Arc::clone(&processor);
            tokio::task::spawn_blocking(move || {
                processor.process_upload(&upload.bytes, &upload.file_name)
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| CommandError::Internal(format!("Upload worker failed: {e}")))?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Read files from disk and process them. Unreadable paths fail the command
/// before any upload starts.
pub async fn process_files(
    processor: Arc<UpdProcessor>,
    paths: &[PathBuf],
) -> CommandResult<Vec<ProcessingOutcome>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(Upload::from_path(path).await?);
    }
    log::info!("Processing {} upload(s)", uploads.len());
    process_uploads(processor, uploads).await
}
