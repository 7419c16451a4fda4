//! Rendering operation: rasterise every page and package the PNGs.

use std::io::{Cursor, Write};

use common::ServiceError;
use image::{ImageFormat, RgbImage};
use tracing::{debug, info};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::pdf::{BackendError, Rasterizer};

/// Linear scale applied to each page's native size.
pub const RENDER_SCALE: f32 = 2.0;

/// Result of rendering a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// One-page document: a single PNG.
    Image(Vec<u8>),
    /// Multi-page document: a stored ZIP with `page_<n>.png` entries.
    Archive { zip: Vec<u8>, pages: usize },
}

/// Render `document` to PNG.
///
/// # Errors
///
/// - [`ServiceError::PasswordRequired`] if it is encrypted and `password` is `None`.
/// - [`ServiceError::WrongPassword`] if `password` does not open it.
/// - [`ServiceError::Processing`] for anything else, including a document
///   with no pages.
pub fn render(
    rasterizer: &dyn Rasterizer,
    document: &[u8],
    password: Option<String>,
) -> Result<Rendered, ServiceError> {
    let rasters = rasterizer
        .render_pages(document, password, RENDER_SCALE)
        .map_err(|e| match e {
            BackendError::PasswordRequired => ServiceError::PasswordRequired,
            BackendError::WrongPassword => ServiceError::WrongPassword,
            other => ServiceError::processing("could not render document", other.to_string()),
        })?;

    let pngs = rasters
        .iter()
        .map(encode_png)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServiceError::processing("could not encode page image", e.to_string()))?;

    match pngs.len() {
        0 => Err(ServiceError::Processing {
            message: "the document has no pages".into(),
            details: None,
        }),
        1 => {
            info!("rendered single page");
            Ok(Rendered::Image(pngs.into_iter().next().unwrap_or_default()))
        }
        pages => {
            let zip = package_archive(&pngs)
                .map_err(|e| ServiceError::processing("could not build archive", e.to_string()))?;
            info!(pages, zip_bytes = zip.len(), "rendered pages into archive");
            Ok(Rendered::Archive { zip, pages })
        }
    }
}

/// Encode an RGB raster as PNG.
pub fn encode_png(raster: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(bytes = buf.len(), "encoded page as PNG");
    Ok(buf)
}

/// Archive entry name for the 0-based page `index`.
pub fn entry_name(index: usize) -> String {
    format!("page_{}.png", index + 1)
}

/// Pack PNGs into a ZIP archive with stored (uncompressed) entries.
pub fn package_archive(pngs: &[Vec<u8>]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        for (i, png) in pngs.iter().enumerate() {
            zip.start_file(entry_name(i), options)?;
            zip.write_all(png)?;
        }
        zip.finish()?;
    }
    Ok(zip_buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::MockRasterizer;
    use common::ErrorCode;
    use image::Rgb;
    use mockall::predicate::{always, eq};
    use std::io::Read;

    fn page(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn rasterizer_returning(pages: usize) -> MockRasterizer {
        let mut r = MockRasterizer::new();
        r.expect_render_pages()
            .with(always(), always(), eq(RENDER_SCALE))
            .returning(move |_, _, _| Ok((0..pages).map(|_| page(8, 10)).collect()));
        r
    }

    #[test]
    fn single_page_is_png_image() {
        let out = render(&rasterizer_returning(1), b"%PDF", None).unwrap();
        let png = match out {
            Rendered::Image(png) => png,
            other => panic!("expected image, got {other:?}"),
        };
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 10));
    }

    #[test]
    fn three_pages_are_stored_zip_entries() {
        let out = render(&rasterizer_returning(3), b"%PDF", None).unwrap();
        let (zip, pages) = match out {
            Rendered::Archive { zip, pages } => (zip, pages),
            other => panic!("expected archive, got {other:?}"),
        };
        assert_eq!(pages, 3);

        let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
        assert_eq!(archive.len(), 3);
        for i in 0..3 {
            let mut entry = archive.by_index(i).unwrap();
            assert_eq!(entry.name(), format!("page_{}.png", i + 1));
            assert_eq!(entry.compression(), CompressionMethod::Stored);
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"));
        }
    }

    #[test]
    fn password_is_passed_through() {
        let mut r = MockRasterizer::new();
        r.expect_render_pages()
            .with(always(), eq(Some("pw".to_string())), always())
            .times(1)
            .returning(|_, _, _| Ok(vec![page(2, 2)]));
        assert!(render(&r, b"%PDF", Some("pw".into())).is_ok());
    }

    #[test]
    fn encrypted_without_password_is_password_required() {
        let mut r = MockRasterizer::new();
        r.expect_render_pages()
            .returning(|_, _, _| Err(BackendError::PasswordRequired));
        let err = render(&r, b"%PDF", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PasswordRequired);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn wrong_password_is_unauthorised() {
        let mut r = MockRasterizer::new();
        r.expect_render_pages()
            .returning(|_, _, _| Err(BackendError::WrongPassword));
        let err = render(&r, b"%PDF", Some("bad".into())).unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn malformed_document_is_processing_error() {
        let mut r = MockRasterizer::new();
        r.expect_render_pages()
            .returning(|_, _, _| Err(BackendError::Malformed("bad xref".into())));
        let err = render(&r, b"junk", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProcessingError);
        assert!(err.details().unwrap().contains("bad xref"));
    }

    #[test]
    fn empty_document_is_processing_error() {
        let err = render(&rasterizer_returning(0), b"%PDF", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProcessingError);
    }

    #[test]
    fn entry_names_are_one_based() {
        assert_eq!(entry_name(0), "page_1.png");
        assert_eq!(entry_name(9), "page_10.png");
    }
}
