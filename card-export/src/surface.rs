//! Capabilities the view layer exposes to the export pipeline.
//!
//! A [`CardHost`] resolves container identifiers to [`CardSurface`]s. A
//! surface owns one visible face at a time, a set of interactive controls,
//! and optionally a [`FaceControl`] that switches faces.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use card_core::{CardFace, PersonFields, PixelSize};

/// The element that renders the currently visible face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceNode {
    /// Identifier of the owning container.
    pub container_id: String,
    /// Rendered size in CSS pixels.
    pub size: PixelSize,
    /// Structural marker the node was found by, e.g. a fixed-width class.
    pub marker: String,
}

/// Index of an interactive control within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub usize);

/// Resolves container identifiers.
pub trait CardHost: Send + Sync {
    /// The container with this identifier, if it exists.
    fn container(&self, id: &str) -> Option<Arc<dyn CardSurface>>;
}

/// A rendered card container.
pub trait CardSurface: Send + Sync {
    /// Container identifier.
    fn id(&self) -> &str;

    /// The node holding the visible face, if rendered.
    fn face_node(&self) -> Option<FaceNode>;

    /// All interactive controls under the container.
    fn controls(&self) -> Vec<ControlId>;

    /// Whether a control is currently visible.
    fn is_control_visible(&self, control: ControlId) -> bool;

    /// Show or hide a control.
    fn set_control_visible(&self, control: ControlId, visible: bool);

    /// The face switch, if the container has one.
    fn face_control(&self) -> Option<Arc<dyn FaceControl>>;

    /// The structured record the card is drawn from.
    fn person(&self) -> Option<PersonFields>;
}

/// Explicit accessor/mutator for the visible face.
#[async_trait]
pub trait FaceControl: Send + Sync {
    /// The face currently visible.
    fn face(&self) -> CardFace;

    /// Request a face. Rendering may complete asynchronously.
    fn set_face(&self, face: CardFace);

    /// Resolve once the last face change has rendered.
    ///
    /// Hosts without a render signal keep the default, a plain sleep of
    /// `fallback`. Callers bound this wait with a timeout.
    async fn settled(&self, fallback: Duration) {
        tokio::time::sleep(fallback).await;
    }
}

/// A toggle button whose label encodes the visible face.
pub trait ToggleButton: Send + Sync {
    /// Current label text, e.g. `Show Back`.
    fn label(&self) -> String;

    /// Activate the button.
    fn click(&self);
}

/// Adapts a label-encoded [`ToggleButton`] to [`FaceControl`].
///
/// The face is read from the label ("Show Front" means the back is
/// showing). Changing face clicks the button only when the requested face
/// is not already visible.
pub struct LabelFaceControl<B> {
    button: B,
}

impl<B: ToggleButton> LabelFaceControl<B> {
    /// Wrap a toggle button.
    pub fn new(button: B) -> Self {
        Self { button }
    }

    /// True if the label says the back is showing.
    pub fn currently_showing_back(&self) -> bool {
        self.face() == CardFace::Back
    }
}

#[async_trait]
impl<B: ToggleButton> FaceControl for LabelFaceControl<B> {
    fn face(&self) -> CardFace {
        CardFace::from_toggle_label(&self.button.label())
    }

    fn set_face(&self, face: CardFace) {
        if self.face() != face {
            self.button.click();
        }
    }
}

/// Design-size check used by the locator.
#[must_use]
pub fn matches_design(node: &FaceNode, design: PixelSize) -> bool {
    node.size == design
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;

    struct Button {
        back: AtomicBool,
        clicks: AtomicU32,
    }

    impl ToggleButton for &Button {
        fn label(&self) -> String {
            let face = if self.back.load(Ordering::SeqCst) {
                CardFace::Back
            } else {
                CardFace::Front
            };
            face.toggle_label().to_string()
        }

        fn click(&self) {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            self.back.fetch_xor(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_label_control_reads_and_sets_face() {
        let button = Button {
            back: AtomicBool::new(true),
            clicks: AtomicU32::new(0),
        };
        let control = LabelFaceControl::new(&button);
        assert!(control.currently_showing_back());

        control.set_face(CardFace::Back);
        assert_eq!(button.clicks.load(Ordering::SeqCst), 0);

        control.set_face(CardFace::Front);
        assert_eq!(control.face(), CardFace::Front);
        assert_eq!(button.clicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_settled_sleeps_for_fallback() {
        let button = Button {
            back: AtomicBool::new(false),
            clicks: AtomicU32::new(0),
        };
        let control = LabelFaceControl::new(&button);
        let start = tokio::time::Instant::now();
        control.settled(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
