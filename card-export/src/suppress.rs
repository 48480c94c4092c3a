//! Scoped suppression of interactive controls during capture.

use std::sync::Arc;

use crate::surface::{CardSurface, ControlId};

/// Hides a container's visible controls until dropped.
///
/// Only the controls this guard hid are shown again; controls that were
/// already hidden stay hidden. Restoration runs on every exit path,
/// including early returns and unwinding.
pub struct ControlsHidden {
    surface: Arc<dyn CardSurface>,
    hidden: Vec<ControlId>,
}

impl ControlsHidden {
    /// Hide every visible control under `surface`.
    #[must_use]
    pub fn hide(surface: Arc<dyn CardSurface>) -> Self {
        let hidden: Vec<ControlId> = surface
            .controls()
            .into_iter()
            .filter(|&control| surface.is_control_visible(control))
            .collect();

        for &control in &hidden {
            surface.set_control_visible(control, false);
        }

        tracing::trace!(container = surface.id(), count = hidden.len(), "controls hidden");
        Self { surface, hidden }
    }

    /// Number of controls this guard hid.
    #[must_use]
    pub fn count(&self) -> usize {
        self.hidden.len()
    }
}

impl Drop for ControlsHidden {
    fn drop(&mut self) {
        for &control in &self.hidden {
            self.surface.set_control_visible(control, true);
        }
        tracing::trace!(
            container = self.surface.id(),
            count = self.hidden.len(),
            "controls restored"
        );
    }
}
