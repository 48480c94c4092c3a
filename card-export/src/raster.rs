//! Face rasterization.

use async_trait::async_trait;
use card_core::{CardFace, ExportConfig, PixelSize};
use image::{ImageEncoder, RgbaImage};

use crate::error::{ExportError, ExportResult};
use crate::surface::FaceNode;

/// Background fill behind the captured face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Keep transparency (PDF placement).
    Transparent,
    /// Flatten onto white (PNG downloads).
    White,
}

/// Parameters for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Design size of the face in CSS pixels.
    pub size: PixelSize,
    /// Upscale multiplier for print-quality output.
    pub scale: u32,
    /// Background fill.
    pub background: Background,
    /// Let remote (cross-origin) images load or be skipped without failing.
    pub allow_cross_origin: bool,
}

impl CaptureOptions {
    /// Options derived from the export configuration.
    #[must_use]
    pub fn from_config(config: &ExportConfig, background: Background) -> Self {
        Self {
            size: config.design_size,
            scale: config.raster_scale,
            background,
            allow_cross_origin: true,
        }
    }

    /// Expected output size in pixels.
    #[must_use]
    pub fn output_size(&self) -> PixelSize {
        self.size.scaled(self.scale)
    }
}

/// Renders a face node to a bitmap.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Capture the node as it is rendered right now.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Raster`] if rendering fails.
    async fn capture(&self, node: &FaceNode, options: &CaptureOptions) -> ExportResult<RgbaImage>;
}

/// A captured face.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Which face the bitmap shows.
    pub face: CardFace,
    /// RGBA pixels.
    pub image: RgbaImage,
}

impl RasterImage {
    /// Tag a bitmap with its face.
    #[must_use]
    pub fn new(face: CardFace, image: RgbaImage) -> Self {
        Self { face, image }
    }

    /// Bitmap size.
    #[must_use]
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.image.width(), self.image.height())
    }

    /// True if either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_png(&self) -> ExportResult<Vec<u8>> {
        encode_png(&self.image)
    }
}

/// Encode an RGBA bitmap as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder rejects the image.
pub fn encode_png(image: &RgbaImage) -> ExportResult<Vec<u8>> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
