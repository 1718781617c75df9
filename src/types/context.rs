//! Per-request observability handle.
//!
//! Every engine component receives a `&RequestContext` and prefixes its log
//! lines with the request id, so interleaved output from concurrent uploads
//! can be told apart.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            request_id: id[..8].to_string(),
        }
    }

    pub fn with_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
