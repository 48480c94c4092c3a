//! SVG rasterization through resvg/tiny-skia.

use std::sync::{Arc, OnceLock};

use image::RgbaImage;

use crate::error::{ExportError, ExportResult};
use crate::raster::Background;

/// System fonts, loaded once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document at its declared pixel size.
///
/// Remote `<image>` references are not fetched; they render as nothing
/// instead of failing the capture.
///
/// # Errors
///
/// Returns [`ExportError::Raster`] if the SVG cannot be parsed or the
/// declared size is unusable.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize_svg(svg: &str, background: Background) -> ExportResult<RgbaImage> {
    let opt = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| ExportError::Raster(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width().ceil() as u32;
    let px_h = tree.size().height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w, px_h)
        .ok_or_else(|| ExportError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;

    if background == Background::White {
        pixmap.fill(tiny_skia::Color::WHITE);
    }

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap_to_rgba(&pixmap)
}

/// Convert a premultiplied pixmap into a straight-alpha RGBA image.
fn pixmap_to_rgba(pixmap: &tiny_skia::Pixmap) -> ExportResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| ExportError::Raster("pixel buffer size mismatch".to_string()))
}

/// Escape special XML characters.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
