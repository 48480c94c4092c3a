//! Physical card geometry and page placement.
//!
//! All millimetre rectangles use a top-left origin with y growing downwards,
//! the way the page is read. PDF writers flip to bottom-left themselves.

use serde::{Deserialize, Serialize};

use crate::CardFace;

/// ID-1 card width in millimetres.
pub const CARD_WIDTH_MM: f32 = 85.6;

/// ID-1 card height in millimetres.
pub const CARD_HEIGHT_MM: f32 = 54.0;

/// Corner radius of the printed cutting guide in millimetres.
pub const CARD_CORNER_RADIUS_MM: f32 = 3.0;

/// A4 page width in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimetres.
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Distance from the top of the page to the front card.
pub const FRONT_TOP_MM: f32 = 60.0;

/// Vertical gap between the front and back cards.
pub const FACE_GAP_MM: f32 = 40.0;

/// Distance the cutting guide sits outside the card edge.
pub const GUIDE_OUTSET_MM: f32 = 2.0;

/// Design width of a rendered card face in CSS pixels.
pub const DESIGN_WIDTH_PX: u32 = 400;

/// Design height of a rendered card face in CSS pixels.
pub const DESIGN_HEIGHT_PX: u32 = 250;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a new size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The fixed design size of a card face.
    #[must_use]
    pub fn design() -> Self {
        Self::new(DESIGN_WIDTH_PX, DESIGN_HEIGHT_PX)
    }

    /// Multiply both dimensions by an integer scale factor.
    #[must_use]
    pub fn scaled(self, scale: u32) -> Self {
        Self::new(
            self.width.saturating_mul(scale),
            self.height.saturating_mul(scale),
        )
    }

    /// True if either dimension is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle in millimetres (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MmRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl MmRect {
    /// Create a new rectangle.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow the rectangle by `d` on every side.
    #[must_use]
    pub fn outset(&self, d: f32) -> Self {
        Self::new(
            self.x - d,
            self.y - d,
            self.width + 2.0 * d,
            self.height + 2.0 * d,
        )
    }

    /// True if the interiors of the two rectangles intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if `other` lies entirely within this rectangle.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Placement of one card face on a printed page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePlacement {
    /// Which face this placement holds.
    pub face: CardFace,
    /// The card itself at physical size.
    pub card: MmRect,
    /// The cutting guide drawn around the card.
    pub guide: MmRect,
    /// Baseline of the face heading.
    pub heading_y: f32,
    /// Baseline of the cutting caption.
    pub caption_y: f32,
}

/// Placement of the card faces on an A4 page.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// Page width in millimetres.
    pub page_width: f32,
    /// Page height in millimetres.
    pub page_height: f32,
    /// One placement per exported face, front first.
    pub faces: Vec<FacePlacement>,
}

impl CardLayout {
    /// Lay out the front (and optionally the back) on an A4 portrait page.
    ///
    /// Cards are centred horizontally; the back sits one card height plus a
    /// fixed gap below the front.
    #[must_use]
    pub fn a4(both_sides: bool) -> Self {
        let card_x = (A4_WIDTH_MM - CARD_WIDTH_MM) / 2.0;
        let front_y = FRONT_TOP_MM;
        let back_y = front_y + CARD_HEIGHT_MM + FACE_GAP_MM;

        let place = |face: CardFace, y: f32, heading_y: f32| {
            let card = MmRect::new(card_x, y, CARD_WIDTH_MM, CARD_HEIGHT_MM);
            FacePlacement {
                face,
                card,
                guide: card.outset(GUIDE_OUTSET_MM),
                heading_y,
                caption_y: y - 5.0,
            }
        };

        let mut faces = vec![place(CardFace::Front, front_y, 30.0)];
        if both_sides {
            faces.push(place(CardFace::Back, back_y, back_y - 25.0));
        }

        Self {
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            faces,
        }
    }

    /// The page as a rectangle.
    #[must_use]
    pub fn page(&self) -> MmRect {
        MmRect::new(0.0, 0.0, self.page_width, self.page_height)
    }

    /// Placement of a given face, if it is on the page.
    #[must_use]
    pub fn placement(&self, face: CardFace) -> Option<&FacePlacement> {
        self.faces.iter().find(|p| p.face == face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_card_size_is_physical() {
        let layout = CardLayout::a4(true);
        for p in &layout.faces {
            assert!((p.card.width - 85.6).abs() < f32::EPSILON);
            assert!((p.card.height - 54.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_a4_cards_centered() {
        let layout = CardLayout::a4(false);
        let card = layout.faces[0].card;
        let left = card.x;
        let right = layout.page_width - card.right();
        assert!((left - right).abs() < 0.001);
    }

    #[test]
    fn test_a4_front_and_back_do_not_overlap() {
        let layout = CardLayout::a4(true);
        let front = layout.placement(CardFace::Front).expect("front");
        let back = layout.placement(CardFace::Back).expect("back");
        assert!(!front.card.overlaps(&back.card));
        assert!(!front.guide.overlaps(&back.guide));
        assert!(back.heading_y > front.guide.bottom());
    }

    #[test]
    fn test_a4_everything_on_page() {
        let layout = CardLayout::a4(true);
        let page = layout.page();
        for p in &layout.faces {
            assert!(page.contains(&p.guide));
        }
    }

    #[test]
    fn test_single_side_has_one_face() {
        let layout = CardLayout::a4(false);
        assert_eq!(layout.faces.len(), 1);
        assert!(layout.placement(CardFace::Back).is_none());
    }

    #[test]
    fn test_pixel_size() {
        let size = PixelSize::design().scaled(3);
        assert_eq!(size, PixelSize::new(1200, 750));
        assert!(PixelSize::new(0, 10).is_empty());
        assert!(!size.is_empty());
    }

    #[test]
    fn test_overlap_edges_touching_is_not_overlap() {
        let a = MmRect::new(0.0, 0.0, 10.0, 10.0);
        let b = MmRect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&MmRect::new(9.0, 9.0, 5.0, 5.0)));
    }

    proptest::proptest! {
        #[test]
        fn prop_outset_contains_original(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            w in 0.0f32..300.0,
            h in 0.0f32..300.0,
            d in 0.5f32..20.0,
        ) {
            let rect = MmRect::new(x, y, w, h);
            proptest::prop_assert!(rect.outset(d).contains(&rect));
        }

        #[test]
        fn prop_scaled_size_multiplies(w in 0u32..2000, h in 0u32..2000, scale in 1u32..8) {
            let scaled = PixelSize::new(w, h).scaled(scale);
            proptest::prop_assert_eq!(scaled, PixelSize::new(w * scale, h * scale));
        }
    }
}
