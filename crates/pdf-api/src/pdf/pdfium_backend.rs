//! [`Rasterizer`] backed by pdfium via `pdfium-render`.
//!
//! pdfium keeps global library state, so the bindings are created per call
//! inside the blocking task rather than shared across the async runtime.

use image::RgbImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::{BackendError, Rasterizer};

/// Renders pages through a pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    /// Directory holding the pdfium library; the system search path otherwise.
    library_dir: Option<String>,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<String>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, BackendError> {
        let bindings = match self.library_dir.as_deref() {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| BackendError::Library(format!("pdfium library unavailable: {e:?}")))?;
        Ok(Pdfium::new(bindings))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn render_pages(
        &self,
        document: &[u8],
        password: Option<String>,
        scale: f32,
    ) -> Result<Vec<RgbImage>, BackendError> {
        let pdfium = self.bind()?;
        let doc = pdfium
            .load_pdf_from_byte_slice(document, password.as_deref())
            .map_err(|e| classify_load_error(e, password.is_some()))?;

        let pages = doc.pages();
        info!(pages = pages.len(), "document opened for rendering");

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut rasters = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                BackendError::Library(format!("failed to render page {}: {e:?}", idx + 1))
            })?;
            let raster = bitmap.as_image().into_rgb8();
            debug!(
                page = idx + 1,
                width = raster.width(),
                height = raster.height(),
                "page rendered"
            );
            rasters.push(raster);
        }
        Ok(rasters)
    }
}

/// Map a pdfium load failure onto the backend taxonomy. pdfium reports both
/// "no password" and "wrong password" as the same internal password error.
fn classify_load_error(err: PdfiumError, password_supplied: bool) -> BackendError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if password_supplied {
                BackendError::WrongPassword
            } else {
                BackendError::PasswordRequired
            }
        }
        PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError | PdfiumInternalError::FileError,
        ) => BackendError::Malformed(format!("{err:?}")),
        other => BackendError::Library(format!("{other:?}")),
    }
}
