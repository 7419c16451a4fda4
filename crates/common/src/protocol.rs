//! Request and response types exchanged with callers over the public HTTP API.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Document endpoints
// ---------------------------------------------------------------------------

/// Raw request body for `POST /remove-pdf-password` and `POST /pdf-to-image`.
///
/// Callers use either `pdf_base64` or `pdfBase64` for the document. Both are
/// accepted; when both are present the snake-case field wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,

    #[serde(default, rename = "pdfBase64", skip_serializing_if = "Option::is_none")]
    pub pdf_base64_camel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl DocumentRequest {
    /// The base64 document, whichever field name carried it. Empty strings
    /// count as absent.
    pub fn document(&self) -> Option<&str> {
        non_empty(self.pdf_base64.as_deref()).or_else(|| non_empty(self.pdf_base64_camel.as_deref()))
    }

    /// The password, if present and non-empty.
    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Successful response body for the decryption operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub message: String,
    /// Base64 of the re-serialised, unencrypted document.
    pub pdf_base64: String,
}

/// Successful response body for the rendering operation, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderResponse {
    /// Single-page document: one PNG.
    Image { message: String, image_base64: String },
    /// Multi-page document: a stored ZIP archive with one PNG per page.
    Zip {
        message: String,
        zip_base64: String,
        page_count: usize,
    },
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code (e.g. `"WRONG_PASSWORD"`).
    pub error: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
    /// Diagnostic detail for 500-class failures, only when the deployment
    /// exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Build the body for `err`, attaching its details only if `expose_details`.
    pub fn from_error(err: &ServiceError, expose_details: bool) -> Self {
        let mut body = Self::new(err.code().as_str(), err.to_string());
        if expose_details {
            body.details = err.details().map(str::to_owned);
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    pub message: String,
}
