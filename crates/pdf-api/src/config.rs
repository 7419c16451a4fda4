//! Configuration loading and validation for the PDF service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is present but invalid.
//! The resulting [`Config`] is never mutated after startup.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use serde::Deserialize;

/// Bytes in one megabyte, as used for the document size limit.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Slack added to the transport body limit for JSON framing and the password.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum decoded document size, in megabytes.
    #[serde(default = "default_max_pdf_size_mb")]
    pub max_pdf_size_mb: f64,

    /// Comma-separated list of allowed CORS origins, or `*` for any origin.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Include diagnostic `details` in 500-class response bodies.
    #[serde(default)]
    pub expose_error_details: bool,

    /// Upper bound on a request, body read included, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory containing the pdfium shared library. When unset the system
    /// library search path is used.
    #[serde(default)]
    pub pdfium_library_path: Option<String>,
}

fn default_port() -> u16 {
    5000
}
fn default_max_pdf_size_mb() -> f64 {
    3.0
}
fn default_cors_origin() -> String {
    "*".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_pdf_size_mb: default_max_pdf_size_mb(),
            cors_origin: default_cors_origin(),
            log_level: default_log_level(),
            expose_error_details: false,
            request_timeout_secs: default_request_timeout_secs(),
            pdfium_library_path: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if !self.max_pdf_size_mb.is_finite() || self.max_pdf_size_mb <= 0.0 {
            anyhow::bail!("MAX_PDF_SIZE_MB must be a positive number");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        if self.cors_origins().is_empty() {
            anyhow::bail!("CORS_ORIGIN must name at least one origin or `*`");
        }
        for origin in self.cors_origins() {
            if origin != "*" && HeaderValue::from_str(origin).is_err() {
                anyhow::bail!("CORS_ORIGIN entry {origin:?} is not a valid header value");
            }
        }
        Ok(())
    }

    /// Largest accepted decoded document, in bytes. A document of exactly
    /// this length passes the size gate.
    pub fn max_document_bytes(&self) -> usize {
        (self.max_pdf_size_mb * BYTES_PER_MB).floor() as usize
    }

    /// Transport-level request body limit: room for a limit-sized document in
    /// base64 twice over, plus framing slack. Anything larger is rejected
    /// before the JSON is parsed.
    pub fn max_body_bytes(&self) -> usize {
        let encoded = self.max_document_bytes().div_ceil(3) * 4;
        encoded.saturating_mul(2).saturating_add(BODY_LIMIT_SLACK)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Allowed CORS origins, trimmed, with empty entries dropped.
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect()
    }
}
