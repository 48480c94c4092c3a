//! Export pipeline error types.

use std::time::Duration;

use card_core::CardFace;
use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// The pipeline step a timeout interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for a face change to render.
    Settle,
    /// Rasterizing a face.
    Capture,
    /// Waiting for the print document to load.
    PrintLoad,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settle => write!(f, "settle"),
            Self::Capture => write!(f, "capture"),
            Self::PrintLoad => write!(f, "print load"),
        }
    }
}

/// Errors that can occur while capturing or exporting a card.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No container with the given identifier.
    #[error("Card container not found: {0}")]
    TargetNotFound(String),

    /// The container holds no face node with the card's design size.
    #[error("Card face not found in container: {0}")]
    FaceNotFound(String),

    /// Dual-sided capture requested but the container has no face toggle.
    #[error("Face toggle not found in container: {0}")]
    ToggleMissing(String),

    /// The face accessor disagrees with the face that was requested.
    #[error("Expected {expected} face after toggle, found {actual}")]
    FaceMismatch {
        /// Face that was requested.
        expected: CardFace,
        /// Face the control reports.
        actual: CardFace,
    },

    /// The rasterizer returned a bitmap with zero width or height.
    #[error("Captured {0} face is empty")]
    EmptyRaster(CardFace),

    /// A print context could not be opened.
    #[error("Print window could not be opened")]
    PopupBlocked,

    /// A bounded wait expired.
    #[error("Timed out during {stage} after {after:?}")]
    Timeout {
        /// Step that timed out.
        stage: Stage,
        /// The bound that expired.
        after: Duration,
    },

    /// The rasterizer failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Composing or encoding the output failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The output sink rejected the artifact.
    #[error("Output sink failed: {0}")]
    Sink(String),

    /// Filesystem error in a native sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Returns true for timing races the settle-then-capture step may retry.
    ///
    /// Missing targets, missing controls and empty rasters are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::FaceMismatch { .. })
    }
}
