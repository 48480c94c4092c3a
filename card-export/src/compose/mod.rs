//! Output composers.
//!
//! Every export shares the same captured faces; only composition differs.
//!
//! - `pdf` - A4 page with physical-size cards, headings and cutting guides
//! - `composite` - one PNG stacking both faces with labels
//! - `print` - self-contained HTML/CSS print document rebuilt from the person record

pub mod composite;
pub mod pdf;
pub mod print;

pub use composite::{compose_composite, CompositeLayout};
pub use pdf::render_pdf;
pub use print::PrintDocument;

/// Printing instructions shared by the PDF and composite outputs.
pub const PRINTING_INSTRUCTIONS: [&str; 4] = [
    "1. Print this page on A4 paper (preferably cardstock)",
    "2. Cut along the dotted lines around each card",
    "3. Place cut cards in plastic card sleeves for protection",
    "4. Standard credit card size: 85.6mm x 54mm",
];

/// Caption printed next to each cutting guide.
pub const CUT_CAPTION: &str = "Cut along dotted lines";
