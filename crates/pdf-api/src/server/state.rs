//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::pdf::{Decryptor, LopdfDecryptor, PdfiumRasterizer, Rasterizer};

/// Application state shared across all request handlers.
///
/// Built once at startup and never mutated. All fields are `Arc`-wrapped so
/// Axum can clone the state per request without copying anything expensive.
#[derive(Clone)]
pub struct AppState {
    /// Validated service configuration.
    pub config: Arc<Config>,
    /// Backend used by the decryption operation.
    pub decryptor: Arc<dyn Decryptor>,
    /// Backend used by the rendering operation.
    pub rasterizer: Arc<dyn Rasterizer>,
}

impl AppState {
    /// Create a new [`AppState`] with explicit backends.
    pub fn new(
        config: Config,
        decryptor: Arc<dyn Decryptor>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            decryptor,
            rasterizer,
        }
    }

    /// Create an [`AppState`] wired to the production `lopdf` and pdfium backends.
    pub fn from_config(config: Config) -> Self {
        let rasterizer = PdfiumRasterizer::new(config.pdfium_library_path.clone());
        Self::new(config, Arc::new(LopdfDecryptor::new()), Arc::new(rasterizer))
    }
}

impl Default for AppState {
    /// Production backends with default configuration, suitable for tests
    /// that never reach a document library.
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}
