//! PDF composition.
//!
//! Places each captured face on an A4 page at exact ID-1 size. Layout
//! rectangles are top-left based; printpdf measures from the bottom-left,
//! so every y is flipped against the page height here.

use card_core::geometry::MmRect;
use card_core::{CardLayout, PixelSize};
use printpdf::{
    BuiltinFont, Color, ImageTransform, Line, LineDashPattern, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};

use crate::compose::{CUT_CAPTION, PRINTING_INSTRUCTIONS};
use crate::error::{ExportError, ExportResult};
use crate::raster::RasterImage;

/// Resolution images are embedded at before scaling.
const EMBED_DPI: f32 = 300.0;

/// Millimetres per typographic point.
const MM_PER_PT: f32 = 25.4 / 72.0;

/// Image transform placing a bitmap of `px` pixels exactly over `card`.
///
/// Returns `(translate_x, translate_y, scale_x, scale_y)` in printpdf's
/// bottom-left coordinate space.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn image_placement(card: &MmRect, px: PixelSize, page_height: f32) -> (f32, f32, f32, f32) {
    let natural_w = px.width as f32 / EMBED_DPI * 25.4;
    let natural_h = px.height as f32 / EMBED_DPI * 25.4;
    (
        card.x,
        page_height - card.bottom(),
        card.width / natural_w,
        card.height / natural_h,
    )
}

/// Compose captured faces onto an A4 page and return the PDF bytes.
///
/// Faces missing from `layout` are skipped. With `guides`, each face gets a
/// heading, a grey dashed cutting guide and a caption; two-sided pages also
/// get printing instructions at the foot.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if an image cannot be embedded or the
/// document cannot be saved.
pub fn render_pdf(
    faces: &[RasterImage],
    layout: &CardLayout,
    guides: bool,
) -> ExportResult<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        "ID Card",
        Mm(layout.page_width),
        Mm(layout.page_height),
        "Cards",
    );
    let layer = doc.get_page(page1).get_layer(layer1);

    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Encode(format!("font: {e}")))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Encode(format!("font: {e}")))?;

    let page_h = layout.page_height;
    let mut placed = 0usize;

    for face in faces {
        let Some(placement) = layout.placement(face.face) else {
            tracing::warn!(face = %face.face, "face has no slot in the page layout");
            continue;
        };

        if guides {
            set_fill(&layer, 0.0);
            let heading = face.face.heading();
            layer.use_text(
                heading,
                14.0,
                Mm(centered_x(heading, 14.0, layout.page_width)),
                Mm(page_h - placement.heading_y),
                &bold,
            );

            layer.set_outline_color(Color::Rgb(Rgb::new(0.78, 0.78, 0.78, None)));
            layer.set_outline_thickness(0.3);
            layer.set_line_dash_pattern(LineDashPattern {
                dash_1: Some(3),
                gap_1: Some(2),
                ..LineDashPattern::default()
            });
            layer.add_line(outline(&placement.guide, page_h));
            layer.set_line_dash_pattern(LineDashPattern::default());

            set_fill(&layer, 0.4);
            layer.use_text(
                CUT_CAPTION,
                8.0,
                Mm(placement.card.x),
                Mm(page_h - placement.caption_y),
                &regular,
            );
        }

        embed(&layer, face, &placement.card, page_h)?;
        placed += 1;
    }

    if guides && placed > 1 {
        set_fill(&layer, 0.0);
        layer.use_text("PRINTING INSTRUCTIONS:", 10.0, Mm(20.0), Mm(40.0), &bold);
        let mut y = 30.0;
        for line in PRINTING_INSTRUCTIONS {
            layer.use_text(line, 8.0, Mm(20.0), Mm(y), &regular);
            y -= 5.0;
        }
    }

    tracing::debug!(faces = placed, "PDF composed");
    doc.save_to_bytes()
        .map_err(|e| ExportError::Encode(format!("PDF save failed: {e}")))
}

/// Embed one face bitmap over `card`.
fn embed(
    layer: &PdfLayerReference,
    face: &RasterImage,
    card: &MmRect,
    page_h: f32,
) -> ExportResult<()> {
    let png = face.to_png()?;
    // Decode with printpdf's bundled image crate for compatibility
    let dynamic_image = printpdf::image_crate::load_from_memory(&png)
        .map_err(|e| ExportError::Encode(format!("Failed to decode PNG for PDF: {e}")))?;
    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

    let (tx, ty, sx, sy) = image_placement(card, face.size(), page_h);
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(tx)),
            translate_y: Some(Mm(ty)),
            scale_x: Some(sx),
            scale_y: Some(sy),
            dpi: Some(EMBED_DPI),
            ..ImageTransform::default()
        },
    );
    Ok(())
}

/// Closed outline of `rect` in bottom-left coordinates.
fn outline(rect: &MmRect, page_h: f32) -> Line {
    let top = page_h - rect.y;
    let bottom = page_h - rect.bottom();
    Line {
        points: vec![
            (Point::new(Mm(rect.x), Mm(bottom)), false),
            (Point::new(Mm(rect.right()), Mm(bottom)), false),
            (Point::new(Mm(rect.right()), Mm(top)), false),
            (Point::new(Mm(rect.x), Mm(top)), false),
        ],
        is_closed: true,
    }
}

fn set_fill(layer: &PdfLayerReference, grey: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(grey, grey, grey, None)));
}

/// Approximate left edge for text centred on the page.
///
/// Builtin fonts carry no metrics here; half an em per glyph is close
/// enough for uppercase headings.
#[allow(clippy::cast_precision_loss)]
fn centered_x(text: &str, size_pt: f32, page_width: f32) -> f32 {
    let width = text.chars().count() as f32 * size_pt * 0.5 * MM_PER_PT;
    ((page_width - width) / 2.0).max(0.0)
}
