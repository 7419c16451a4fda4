//! Request normaliser: raw body bytes → [`DocumentEnvelope`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::DocumentRequest;
use common::ServiceError;

use crate::config::BYTES_PER_MB;

/// Which operation the request is for. Only decryption insists on a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RemovePassword,
    Render,
}

impl Operation {
    fn requires_password(self) -> bool {
        matches!(self, Operation::RemovePassword)
    }
}

/// A validated request: decoded document bytes plus the optional password.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentEnvelope {
    pub document: Vec<u8>,
    pub password: Option<String>,
}

impl std::fmt::Debug for DocumentEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEnvelope")
            .field("document_len", &self.document.len())
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Validate a raw request body for `op`.
///
/// Checks run in a fixed order: JSON shape, document presence, password
/// presence (decryption only), base64 validity, then the size gate against
/// `max_document_bytes`.
///
/// # Errors
///
/// Returns the first [`ServiceError`] hit: `InvalidFormat`,
/// `ParameterMissing`, `InvalidDocument` or `SizeExceeded`.
pub fn normalize(
    body: &[u8],
    op: Operation,
    max_document_bytes: usize,
) -> Result<DocumentEnvelope, ServiceError> {
    let req: DocumentRequest =
        serde_json::from_slice(body).map_err(|e| ServiceError::InvalidFormat(e.to_string()))?;

    let encoded = req
        .document()
        .ok_or(ServiceError::ParameterMissing("pdf_base64"))?;

    let password = req.password().map(str::to_owned);
    if op.requires_password() && password.is_none() {
        return Err(ServiceError::ParameterMissing("password"));
    }

    let document = decode_document(encoded)?;
    check_size(document.len(), max_document_bytes)?;

    Ok(DocumentEnvelope { document, password })
}

/// Decode standard base64, ignoring ASCII whitespace such as MIME line breaks.
fn decode_document(encoded: &str) -> Result<Vec<u8>, ServiceError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ServiceError::InvalidDocument(e.to_string()))
}

fn check_size(len: usize, max_document_bytes: usize) -> Result<(), ServiceError> {
    if len > max_document_bytes {
        return Err(ServiceError::SizeExceeded {
            actual_mb: len as f64 / BYTES_PER_MB,
            limit_mb: max_document_bytes as f64 / BYTES_PER_MB,
        });
    }
    Ok(())
}
