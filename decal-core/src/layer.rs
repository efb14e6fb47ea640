//! Image layers - positioned, rotatable, opacity-blended raster images.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::{Point, Rect, Size};

/// Fraction of normalized space a newly placed layer's larger dimension
/// occupies by default.
const DEFAULT_PLACEMENT_CAP: f32 = 0.75;

/// Unique identifier for an image layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placement of a new layer in normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Center position.
    pub center: Point,
    /// Full extents.
    pub size: Size,
}

impl Placement {
    /// Default placement for a source raster of `source_width` x
    /// `source_height` pixels: centered, aspect preserved, with the larger
    /// dimension capped at 75% of normalized space.
    #[must_use]
    pub fn fitted(source_width: u32, source_height: u32) -> Self {
        let w = source_width.max(1) as f32;
        let h = source_height.max(1) as f32;
        let size = if w >= h {
            Size::new(DEFAULT_PLACEMENT_CAP, DEFAULT_PLACEMENT_CAP * h / w)
        } else {
            Size::new(DEFAULT_PLACEMENT_CAP * w / h, DEFAULT_PLACEMENT_CAP)
        };
        Self {
            center: Point::center(),
            size,
        }
    }
}

/// One placed raster image within the compositor's ordered stack.
///
/// Geometry lives in normalized `[0, 1]` space; the pixel data itself is
/// owned by the compositor and shared read-only across render targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLayer {
    /// Unique identifier.
    pub id: LayerId,
    /// Pixel width of the source raster.
    pub source_width: u32,
    /// Pixel height of the source raster.
    pub source_height: u32,
    /// Center position in normalized space.
    pub center: Point,
    /// Extents in normalized space. Always positive.
    pub size: Size,
    /// Rotation about the center, in radians.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether the layer is drawn.
    pub visible: bool,
    /// Whether the layer is the stack's selected layer.
    pub selected: bool,
}

impl ImageLayer {
    /// Create a layer for a source raster at the given placement.
    #[must_use]
    pub fn new(source_width: u32, source_height: u32, placement: Placement) -> Self {
        Self {
            id: LayerId::new(),
            source_width,
            source_height,
            center: placement.center,
            size: placement.size,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            selected: false,
        }
    }

    /// Axis-aligned bounds in normalized space, ignoring rotation.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.center, self.size)
    }

    /// Clamp opacity into `[0, 1]` and set it.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_placement_landscape() {
        let p = Placement::fitted(200, 100);
        assert!((p.size.width - 0.75).abs() < 1e-6);
        assert!((p.size.height - 0.375).abs() < 1e-6);
        assert_eq!(p.center, Point::center());
    }

    #[test]
    fn test_fitted_placement_portrait() {
        let p = Placement::fitted(100, 400);
        assert!((p.size.height - 0.75).abs() < 1e-6);
        assert!((p.size.width - 0.1875).abs() < 1e-6);
    }

    #[test]
    fn test_fitted_placement_square() {
        let p = Placement::fitted(100, 100);
        assert!((p.size.width - 0.75).abs() < 1e-6);
        assert!((p.size.height - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_opacity_clamped() {
        let mut layer = ImageLayer::new(10, 10, Placement::fitted(10, 10));
        layer.set_opacity(1.7);
        assert!((layer.opacity - 1.0).abs() < 1e-6);
        layer.set_opacity(-0.3);
        assert!(layer.opacity.abs() < 1e-6);
    }
}
