//! # Card Export
//!
//! Captures rendered ID cards and turns them into downloadable or printable
//! artifacts.
//!
//! ## Capture Session
//!
//! ```text
//! TargetLocks ─▶ locate ─▶ ControlsHidden ─▶ FaceToggler ─▶ Rasterizer
//! (per target)   (CardHost)  (drop guard)    (settle/verify)  (timeout/retry)
//!                                                                  │
//!              ┌───────────────────────┬──────────────────────────┤
//!              ▼                       ▼                          ▼
//!        ┌───────────┐          ┌──────────────┐          ┌────────────┐
//!        │ PDF (A4)  │          │ Composite PNG│          │ Print HTML │
//!        └─────┬─────┘          └──────┬───────┘          └─────┬──────┘
//!              ▼                       ▼                        ▼
//!        DownloadSink            DownloadSink               PrintHost
//! ```
//!
//! The view layer plugs in through [`CardHost`], [`Rasterizer`],
//! [`DownloadSink`] and [`PrintHost`]. [`CardBoard`] and
//! [`SvgFaceRasterizer`] are complete in-process implementations.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compose;
pub mod error;
pub mod locator;
pub mod lock;
pub mod pipeline;
pub mod raster;
pub mod sink;
pub mod suppress;
pub mod surface;
pub mod svg;
pub mod toggle;
pub mod view;

pub use compose::{compose_composite, render_pdf, PrintDocument};
pub use error::{ExportError, ExportResult, Stage};
pub use locator::{locate, Target};
pub use lock::{TargetGuard, TargetLocks};
pub use pipeline::CardExporter;
pub use raster::{Background, CaptureOptions, RasterImage, Rasterizer};
pub use sink::{
    Artifact, DirectorySink, DownloadSink, FilePrintHost, MemorySink, PrintHost, PrintWindow,
};
pub use suppress::ControlsHidden;
pub use surface::{
    CardHost, CardSurface, ControlId, FaceControl, FaceNode, LabelFaceControl, ToggleButton,
};
pub use toggle::FaceToggler;
pub use view::{CardBoard, CardView, SvgFaceRasterizer};
