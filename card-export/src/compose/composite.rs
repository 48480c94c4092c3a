//! Composite bitmap: both faces stacked on one white sheet.
//!
//! The sheet furniture (labels, dashed guides, instructions) is drawn as SVG
//! and rasterized; the captured faces are then copied in at their native
//! resolution so no resampling touches them.

use std::fmt::Write;

use image::RgbaImage;

use crate::compose::{CUT_CAPTION, PRINTING_INSTRUCTIONS};
use crate::error::{ExportError, ExportResult};
use crate::raster::{Background, RasterImage};
use crate::svg::{escape_xml, rasterize_svg};

/// Pixel positions of everything on the composite sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLayout {
    /// Sheet width.
    pub width: u32,
    /// Sheet height.
    pub height: u32,
    /// Outer margin.
    pub margin: u32,
    /// Height of the label strip above each face.
    pub label_height: u32,
    /// Vertical gap between the first face and the next label strip.
    pub gap: u32,
    /// Height of the instructions footer (zero without guides).
    pub footer_height: u32,
    /// Top-left corner of each face, in input order.
    pub slots: Vec<(u32, u32)>,
}

impl CompositeLayout {
    /// Lay out `faces` top to bottom, each centred horizontally.
    #[must_use]
    pub fn for_faces(faces: &[RasterImage], guides: bool) -> Self {
        let face_w = faces.iter().map(|f| f.image.width()).max().unwrap_or(0);
        let face_h = faces.iter().map(|f| f.image.height()).max().unwrap_or(0);

        let margin = (face_w / 20).max(8);
        let label_height = (face_h / 6).max(12);
        let gap = (face_h / 4).max(8);
        let footer_height = if guides { (face_h / 2).max(40) } else { 0 };

        let width = face_w + 2 * margin;
        let mut y = margin;
        let mut slots = Vec::with_capacity(faces.len());
        for (i, face) in faces.iter().enumerate() {
            if i > 0 {
                y += gap;
            }
            y += label_height;
            let x = (width - face.image.width()) / 2;
            slots.push((x, y));
            y += face.image.height();
        }
        let height = y + footer_height + margin;

        Self {
            width,
            height,
            margin,
            label_height,
            gap,
            footer_height,
            slots,
        }
    }
}

/// Stack the captured faces into one bitmap.
///
/// # Errors
///
/// Returns an error if `faces` is empty or the sheet cannot be rasterized.
pub fn compose_composite(faces: &[RasterImage], guides: bool) -> ExportResult<RgbaImage> {
    if faces.is_empty() {
        return Err(ExportError::Encode("no faces to compose".to_string()));
    }

    let layout = CompositeLayout::for_faces(faces, guides);
    let svg = sheet_svg(faces, &layout, guides);
    let mut sheet = rasterize_svg(&svg, Background::White)?;

    for (face, &(x, y)) in faces.iter().zip(&layout.slots) {
        image::imageops::overlay(&mut sheet, &face.image, i64::from(x), i64::from(y));
    }

    tracing::debug!(
        width = layout.width,
        height = layout.height,
        faces = faces.len(),
        "composite composed"
    );
    Ok(sheet)
}

/// Labels, guides and instructions for the sheet.
#[allow(clippy::cast_precision_loss)]
fn sheet_svg(faces: &[RasterImage], layout: &CompositeLayout, guides: bool) -> String {
    let mut svg = String::with_capacity(2048);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\">",
        layout.width, layout.height,
    );

    let label_size = layout.label_height as f32 * 0.55;
    let center_x = layout.width as f32 / 2.0;
    let outset = (layout.margin / 3).max(2) as f32;

    for (face, &(x, y)) in faces.iter().zip(&layout.slots) {
        let label_y = y as f32 - layout.label_height as f32 * 0.3;
        let _ = write!(
            svg,
            "<text x=\"{center_x}\" y=\"{label_y}\" font-size=\"{label_size}\" font-weight=\"bold\" fill=\"#000000\" text-anchor=\"middle\" font-family=\"Arial, sans-serif\">{}</text>",
            escape_xml(face.face.heading()),
        );

        if guides {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#cccccc\" stroke-width=\"2\" stroke-dasharray=\"10 5\"/>",
                x as f32 - outset,
                y as f32 - outset,
                face.image.width() as f32 + 2.0 * outset,
                face.image.height() as f32 + 2.0 * outset,
            );
        }
    }

    if guides && layout.footer_height > 0 {
        let line_h = layout.footer_height as f32 / 6.0;
        let text_x = layout.margin as f32;
        let mut text_y = (layout.height - layout.margin - layout.footer_height) as f32 + line_h;
        let _ = write!(
            svg,
            "<text x=\"{text_x}\" y=\"{text_y}\" font-size=\"{}\" font-weight=\"bold\" fill=\"#000000\" font-family=\"Arial, sans-serif\">PRINTING INSTRUCTIONS: {}</text>",
            line_h * 0.8,
            escape_xml(CUT_CAPTION),
        );
        for line in PRINTING_INSTRUCTIONS {
            text_y += line_h;
            let _ = write!(
                svg,
                "<text x=\"{text_x}\" y=\"{text_y}\" font-size=\"{}\" fill=\"#333333\" font-family=\"Arial, sans-serif\">{}</text>",
                line_h * 0.7,
                escape_xml(line),
            );
        }
    }

    svg.push_str("</svg>");
    svg
}
