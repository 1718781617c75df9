use serde::{Deserialize, Serialize};

use crate::types::errors::{ErrorKind, UpdError};

/// Result of one upload, handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub success: bool,
    pub message: String,
    pub error_kind: Option<ErrorKind>,
    pub external_invoice_id: Option<String>,
    pub external_invoice_url: Option<String>,
    /// Set whenever a shipment exists, even if invoice creation failed.
    pub shipment_id: Option<String>,
    pub shipment_url: Option<String>,
    pub flow_id: Option<String>,
}

impl ProcessingOutcome {
    pub fn failure(error: &UpdError, message: String) -> Self {
        Self {
            success: false,
            message,
            error_kind: Some(error.kind()),
            ..Default::default()
        }
    }

    /// A shipment exists in the external system but the request failed.
    pub fn is_partial(&self) -> bool {
        !self.success && self.shipment_id.is_some()
    }
}
