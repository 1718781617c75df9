//! One upload, end to end: validation, temp storage, parsing, token check,
//! reconciliation and the user-facing outcome.

use crate::services::archive::extract_archive;
use crate::services::bundle::{locate_bundle, read_payload};
use crate::services::config::AppConfig;
use crate::services::diagnostics::{status_report, verify_token, StatusReport};
use crate::services::moysklad::{AccountingApi, WebConsole};
use crate::services::parser::{parse_card, parse_main_document};
use crate::services::reconcile::{Reconciler, ReconciliationResult};
use crate::services::report::{failure_message, success_message};
use crate::types::context::RequestContext;
use crate::types::document::ParsedBundle;
use crate::types::errors::{UpdError, UpdResult};
use crate::types::outcome::ProcessingOutcome;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Holds only immutable state, so one instance serves concurrent uploads.
pub struct UpdProcessor {
    config: AppConfig,
    api: Arc<dyn AccountingApi>,
    web: WebConsole,
}

impl UpdProcessor {
    pub fn new(config: AppConfig, api: Arc<dyn AccountingApi>) -> Self {
        let web = WebConsole::new(&config.web_url);
        Self { config, api, web }
    }

    pub fn process_upload(&self, bytes: &[u8], file_name: &str) -> ProcessingOutcome {
        self.process_upload_with(&RequestContext::new(), bytes, file_name)
    }

    /// Never fails: every error becomes an outcome carrying its `ErrorKind`.
    pub fn process_upload_with(
        &self,
        ctx: &RequestContext,
        bytes: &[u8],
        file_name: &str,
    ) -> ProcessingOutcome {
        log::info!("[{}] Starting UPD file processing: {}", ctx.id(), file_name);

        match self.run(ctx, bytes, file_name) {
            Ok((bundle, result)) => {
                log::info!(
                    "[{}] UPD processed: shipment {}, invoice {}",
                    ctx.id(),
                    result.shipment.id,
                    result.invoice.id
                );
                ProcessingOutcome {
                    success: true,
                    message: success_message(&bundle, &result, &self.web),
                    error_kind: None,
                    external_invoice_url: Some(self.web.facture_out_url(&result.invoice.id)),
                    external_invoice_id: Some(result.invoice.id),
                    shipment_url: Some(self.web.demand_url(&result.shipment.id)),
                    shipment_id: Some(result.shipment.id),
                    flow_id: Some(bundle.index.flow_id),
                }
            }
            Err(error) => {
                log::error!("[{}] UPD processing failed: {}", ctx.id(), error);
                let mut outcome =
                    ProcessingOutcome::failure(&error, failure_message(&error, &self.web));
                if let UpdError::InvoiceCreationFailed { shipment, .. } = &error {
                    outcome.shipment_url = Some(self.web.demand_url(&shipment.id));
                    outcome.shipment_id = Some(shipment.id.clone());
                }
                outcome
            }
        }
    }

    fn run(
        &self,
        ctx: &RequestContext,
        bytes: &[u8],
        file_name: &str,
    ) -> UpdResult<(ParsedBundle, ReconciliationResult)> {
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(UpdError::FileTooLarge {
                max_mb: self.config.max_file_size_mb(),
            });
        }
        if !file_name.to_lowercase().ends_with(".zip") {
            return Err(UpdError::InvalidFileType);
        }

        fs::create_dir_all(&self.config.temp_dir)?;
        let mut upload = tempfile::Builder::new()
            .prefix("upd_")
            .suffix(".zip")
            .tempfile_in(&self.config.temp_dir)?;
        upload.write_all(bytes)?;
        upload.flush()?;
        log::debug!("[{}] Temporary file saved: {}", ctx.id(), upload.path().display());

        let bundle = self.parse_archive(ctx, upload.path())?;

        verify_token(ctx, self.api.as_ref())?;
        let result = Reconciler::new(self.api.as_ref(), ctx).reconcile(&bundle)?;
        Ok((bundle, result))
    }

    /// Extract, locate and parse. The scratch tree is gone when this returns.
    pub fn parse_archive(&self, ctx: &RequestContext, archive_path: &Path) -> UpdResult<ParsedBundle> {
        log::info!("[{}] Parsing UPD archive: {}", ctx.id(), archive_path.display());
        let scratch = extract_archive(ctx, archive_path, &self.config.temp_dir)?;

        let index = locate_bundle(scratch.path())?;
        log::info!(
            "[{}] Bundle index: flow {}, main {}, card {}",
            ctx.id(),
            index.flow_id,
            index.main_document_path,
            index.card_path
        );

        let card_text = read_payload(scratch.path(), &index.card_path).map_err(|e| match e {
            UpdError::MalformedIndex(detail) | UpdError::IoFailure(detail) => {
                UpdError::MalformedCard(detail)
            }
            other => other,
        })?;
        let card = parse_card(ctx, &card_text)?;

        let main_text = read_payload(scratch.path(), &index.main_document_path)?;
        let main = parse_main_document(ctx, &main_text, self.config.parse_mode)?;

        let bundle = ParsedBundle {
            index,
            card,
            document: main.document,
            fallback: main.fallback,
        };
        log::info!("[{}] {}", ctx.id(), bundle.summary().replace('\n', "; "));
        Ok(bundle)
    }

    pub fn status(&self, ctx: &RequestContext) -> UpdResult<StatusReport> {
        status_report(
            ctx,
            self.api.as_ref(),
            &self.config.api_url,
            self.config.organization_id.as_deref(),
        )
    }
}

#[cfg(test)]
#[path = "tests/processor_tests.rs"]
mod tests;
