//! Document-library seams.
//!
//! The service never parses PDF itself. Decryption goes through a
//! [`Decryptor`] (backed by `lopdf`) and rasterisation through a
//! [`Rasterizer`] (backed by pdfium). Both traits are blocking; callers run
//! them on `spawn_blocking`.

pub mod lopdf_backend;
pub mod pdfium_backend;

use image::RgbImage;
use thiserror::Error;

pub use lopdf_backend::LopdfDecryptor;
pub use pdfium_backend::PdfiumRasterizer;

/// Whether a document can be opened without a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Opens without a password: never encrypted, or encrypted with an empty
    /// user password.
    Open,
    /// A password is needed to open the document.
    PasswordRequired,
}

/// Errors reported by a document backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The document is encrypted and no password was given.
    #[error("document requires a password")]
    PasswordRequired,

    /// The password does not open the document.
    #[error("incorrect password")]
    WrongPassword,

    /// The bytes are not a readable PDF.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Any other library failure.
    #[error("{0}")]
    Library(String),
}

/// Removes password protection from PDF documents.
#[cfg_attr(test, mockall::automock)]
pub trait Decryptor: Send + Sync {
    /// Capability query: can `document` be opened without a password?
    fn protection(&self, document: &[u8]) -> Result<Protection, BackendError>;

    /// Open `document` with `password` and re-serialise it without encryption.
    fn decrypt(&self, document: &[u8], password: &str) -> Result<Vec<u8>, BackendError>;
}

/// Renders PDF pages to RGB rasters.
#[cfg_attr(test, mockall::automock)]
pub trait Rasterizer: Send + Sync {
    /// Render every page of `document` at `scale` times its native size.
    fn render_pages(
        &self,
        document: &[u8],
        password: Option<String>,
        scale: f32,
    ) -> Result<Vec<RgbImage>, BackendError>;
}
