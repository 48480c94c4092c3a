//! # ID Card Core
//!
//! Shared types for capturing and exporting dual-sided identity cards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Card Model      │  Physical Geometry       │
//! │  - Faces         │  - ID-1 card size        │
//! │  - Person fields │  - A4 page layout        │
//! │  - QR payloads   │  - Pixel design size     │
//! ├─────────────────────────────────────────────┤
//! │  Export Config   │  Errors                  │
//! │  - Settle/timeout│  - CardError             │
//! │  - Raster scale  │                          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod face;
pub mod geometry;
pub mod person;
pub mod qr;

pub use config::ExportConfig;
pub use error::{CardError, CardResult};
pub use face::CardFace;
pub use geometry::{CardLayout, MmRect, PixelSize};
pub use person::PersonFields;
pub use qr::QrEndpoint;

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
