//! Common error types shared across crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable error tokens sent in the `error` field of every
/// failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParameterMissing,
    InvalidFormat,
    InvalidDocument,
    SizeExceeded,
    NoPassword,
    PasswordRequired,
    WrongPassword,
    ProcessingError,
    InternalError,
    MethodInvalid,
    NotFound,
}

impl ErrorCode {
    /// The wire token for this code, e.g. `"WRONG_PASSWORD"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParameterMissing => "PARAMETER_MISSING",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::SizeExceeded => "SIZE_EXCEEDED",
            ErrorCode::NoPassword => "NO_PASSWORD",
            ErrorCode::PasswordRequired => "PASSWORD_REQUIRED",
            ErrorCode::WrongPassword => "WRONG_PASSWORD",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::MethodInvalid => "METHOD_INVALID",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level service error type.
///
/// Every failure a request can hit is expressed as one of these variants.
/// Each maps onto exactly one [`ErrorCode`] and one HTTP status:
///
/// | variant | code | status |
/// |---|---|---|
/// | [`ServiceError::ParameterMissing`] | `PARAMETER_MISSING` | 400 |
/// | [`ServiceError::InvalidFormat`] | `INVALID_FORMAT` | 400 |
/// | [`ServiceError::InvalidDocument`] | `INVALID_DOCUMENT` | 400 |
/// | [`ServiceError::SizeExceeded`] | `SIZE_EXCEEDED` | 413 |
/// | [`ServiceError::RequestTooLarge`] | `SIZE_EXCEEDED` | 413 |
/// | [`ServiceError::NoPassword`] | `NO_PASSWORD` | 400 |
/// | [`ServiceError::PasswordRequired`] | `PASSWORD_REQUIRED` | 400 |
/// | [`ServiceError::WrongPassword`] | `WRONG_PASSWORD` | 401 |
/// | [`ServiceError::Processing`] | `PROCESSING_ERROR` | 500 |
/// | [`ServiceError::Internal`] | `INTERNAL_ERROR` | 500 |
/// | [`ServiceError::MethodInvalid`] | `METHOD_INVALID` | 400 |
/// | [`ServiceError::NotFound`] | `NOT_FOUND` | 404 |
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required request field is absent or empty.
    #[error("the {0} parameter is required")]
    ParameterMissing(&'static str),

    /// The request body is not a JSON object of the expected shape.
    #[error("request body is not valid JSON: {0}")]
    InvalidFormat(String),

    /// The document field is not valid base64.
    #[error("the submitted document is not valid base64: {0}")]
    InvalidDocument(String),

    /// The decoded document is larger than the configured limit.
    #[error("the document size ({actual_mb:.2}MB) exceeds the limit of {limit_mb:.2}MB")]
    SizeExceeded { actual_mb: f64, limit_mb: f64 },

    /// The request body was too large to read; the document inside it is
    /// necessarily over the limit. `body_mb` comes from `Content-Length`
    /// when the client sent one.
    #[error("{}", request_too_large(.body_mb, .limit_mb))]
    RequestTooLarge { body_mb: Option<f64>, limit_mb: f64 },

    /// The decryption operation was given a document that opens without a password.
    #[error("the document is not password protected")]
    NoPassword,

    /// The document is encrypted and no password was supplied.
    #[error("the document is password protected; supply the password")]
    PasswordRequired,

    /// The supplied password does not open the document.
    #[error("the supplied password is incorrect")]
    WrongPassword,

    /// The document library failed while opening, decrypting or rendering.
    #[error("failed to process the document: {message}")]
    Processing {
        message: String,
        /// Diagnostic detail, logged always and returned only when the
        /// deployment exposes error details.
        details: Option<String>,
    },

    /// An unexpected internal error occurred.
    #[error("internal server error")]
    Internal(String),

    /// The route exists but does not accept this HTTP method.
    #[error("method {0} is not supported on this route")]
    MethodInvalid(String),

    /// No route matches the request path.
    #[error("the requested resource does not exist")]
    NotFound,
}

/// The base64 text in the body is a third larger than the document it encodes.
fn request_too_large(body_mb: &Option<f64>, limit_mb: &f64) -> String {
    match body_mb {
        Some(body_mb) => format!(
            "the document size (about {:.2}MB, in a {body_mb:.2}MB request) exceeds the limit of {limit_mb:.2}MB",
            body_mb * 0.75
        ),
        None => format!("the request body is too large; documents are limited to {limit_mb:.2}MB"),
    }
}

impl ServiceError {
    /// Build a [`ServiceError::Processing`] carrying diagnostic detail.
    pub fn processing(message: impl Into<String>, details: impl Into<String>) -> Self {
        ServiceError::Processing {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// The stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::ParameterMissing(_) => ErrorCode::ParameterMissing,
            ServiceError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            ServiceError::InvalidDocument(_) => ErrorCode::InvalidDocument,
            ServiceError::SizeExceeded { .. } | ServiceError::RequestTooLarge { .. } => {
                ErrorCode::SizeExceeded
            }
            ServiceError::NoPassword => ErrorCode::NoPassword,
            ServiceError::PasswordRequired => ErrorCode::PasswordRequired,
            ServiceError::WrongPassword => ErrorCode::WrongPassword,
            ServiceError::Processing { .. } => ErrorCode::ProcessingError,
            ServiceError::Internal(_) => ErrorCode::InternalError,
            ServiceError::MethodInvalid(_) => ErrorCode::MethodInvalid,
            ServiceError::NotFound => ErrorCode::NotFound,
        }
    }

    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::ParameterMissing(_)
            | ServiceError::InvalidFormat(_)
            | ServiceError::InvalidDocument(_)
            | ServiceError::NoPassword
            | ServiceError::PasswordRequired
            | ServiceError::MethodInvalid(_) => 400,
            ServiceError::WrongPassword => 401,
            ServiceError::NotFound => 404,
            ServiceError::SizeExceeded { .. } | ServiceError::RequestTooLarge { .. } => 413,
            ServiceError::Processing { .. } | ServiceError::Internal(_) => 500,
        }
    }

    /// Diagnostic detail attached to 500-class failures, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            ServiceError::Processing { details, .. } => details.as_deref(),
            ServiceError::Internal(detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::ParameterMissing("password").http_status(), 400);
        assert_eq!(ServiceError::InvalidFormat("x".into()).http_status(), 400);
        assert_eq!(ServiceError::InvalidDocument("x".into()).http_status(), 400);
        assert_eq!(ServiceError::NoPassword.http_status(), 400);
        assert_eq!(ServiceError::PasswordRequired.http_status(), 400);
        assert_eq!(ServiceError::WrongPassword.http_status(), 401);
        assert_eq!(
            ServiceError::SizeExceeded {
                actual_mb: 4.0,
                limit_mb: 3.0
            }
            .http_status(),
            413
        );
        assert_eq!(
            ServiceError::RequestTooLarge { body_mb: None, limit_mb: 3.0 }.http_status(),
            413
        );
        assert_eq!(ServiceError::processing("x", "y").http_status(), 500);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
        assert_eq!(ServiceError::MethodInvalid("GET".into()).http_status(), 400);
        assert_eq!(ServiceError::NotFound.http_status(), 404);
    }

    #[test]
    fn codes_serialise_as_stable_tokens() {
        for code in [
            ErrorCode::ParameterMissing,
            ErrorCode::SizeExceeded,
            ErrorCode::WrongPassword,
            ErrorCode::ProcessingError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn size_exceeded_message_uses_two_decimals() {
        let e = ServiceError::SizeExceeded {
            actual_mb: 3.000_000_95,
            limit_mb: 3.0,
        };
        assert_eq!(
            e.to_string(),
            "the document size (3.00MB) exceeds the limit of 3.00MB"
        );
    }

    #[test]
    fn request_too_large_reports_sizes_when_known() {
        let known = ServiceError::RequestTooLarge {
            body_mb: Some(8.0),
            limit_mb: 3.0,
        };
        assert_eq!(
            known.to_string(),
            "the document size (about 6.00MB, in a 8.00MB request) exceeds the limit of 3.00MB"
        );

        let unknown = ServiceError::RequestTooLarge {
            body_mb: None,
            limit_mb: 3.0,
        };
        assert!(unknown.to_string().contains("limited to 3.00MB"));
    }

    #[test]
    fn only_server_errors_carry_details() {
        assert_eq!(
            ServiceError::processing("open failed", "xref broken").details(),
            Some("xref broken")
        );
        assert!(ServiceError::WrongPassword.details().is_none());
        assert!(ServiceError::ParameterMissing("pdf_base64").details().is_none());
    }

    #[test]
    fn display_includes_parameter_name() {
        let e = ServiceError::ParameterMissing("password");
        assert!(e.to_string().contains("password"));
        assert_eq!(e.code(), ErrorCode::ParameterMissing);
    }
}
