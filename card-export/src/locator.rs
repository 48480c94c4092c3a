//! Resolve a container identifier to the face node to rasterize.

use std::sync::Arc;

use card_core::PixelSize;

use crate::error::{ExportError, ExportResult};
use crate::surface::{matches_design, CardHost, CardSurface, FaceNode};

/// A located capture target.
pub struct Target {
    /// The container.
    pub surface: Arc<dyn CardSurface>,
    /// The visible face node, matching the design size.
    pub node: FaceNode,
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("container", &self.surface.id())
            .field("node", &self.node)
            .finish()
    }
}

/// Find the container and its design-sized face node.
///
/// Absence is a markup contract violation and is never retried.
///
/// # Errors
///
/// Returns [`ExportError::TargetNotFound`] if no container has this id, or
/// [`ExportError::FaceNotFound`] if it holds no face node of the design size.
pub fn locate(host: &dyn CardHost, id: &str, design: PixelSize) -> ExportResult<Target> {
    let surface = host
        .container(id)
        .ok_or_else(|| ExportError::TargetNotFound(id.to_string()))?;

    let node = surface
        .face_node()
        .filter(|node| matches_design(node, design))
        .ok_or_else(|| ExportError::FaceNotFound(id.to_string()))?;

    tracing::debug!(container = id, marker = %node.marker, "located card face");
    Ok(Target { surface, node })
}

/// Find only the container.
///
/// # Errors
///
/// Returns [`ExportError::TargetNotFound`] if no container has this id.
pub fn locate_container(host: &dyn CardHost, id: &str) -> ExportResult<Arc<dyn CardSurface>> {
    host.container(id)
        .ok_or_else(|| ExportError::TargetNotFound(id.to_string()))
}
