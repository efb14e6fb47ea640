//! Resolution-independent coordinate space.
//!
//! Layer geometry is expressed in a normalized space where both axes range
//! over `[0, 1]` regardless of the pixel size of any concrete surface. The
//! same layer state renders consistently to an interactive display surface
//! and to higher-resolution texture surfaces: a layer centered at
//! `(0.5, 0.5)` lands at the midpoint of every target.

use serde::{Deserialize, Serialize};

/// Map a normalized-space scalar to a pixel scalar for a surface of the
/// given size.
///
/// `surface_size` must be positive; a non-positive size is a caller
/// contract violation.
#[must_use]
pub fn to_surface(value: f32, surface_size: f32) -> f32 {
    assert!(surface_size > 0.0, "surface size must be positive");
    value * surface_size
}

/// Map a pixel scalar back to normalized space. Exact inverse of
/// [`to_surface`] for the same `surface_size`, up to floating-point
/// rounding.
#[must_use]
pub fn from_surface(value: f32, surface_size: f32) -> f32 {
    assert!(surface_size > 0.0, "surface size must be positive");
    value / surface_size
}

/// A point in normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The center of normalized space.
    #[must_use]
    pub const fn center() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// A size in normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in normalized space, stored as center plus
/// extents.
///
/// Center plus half-extents may exceed `[0, 1]`; clipping is a
/// rendering-time concern, not a storage invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Center of the rectangle.
    pub center: Point,
    /// Full extents of the rectangle.
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from center and size.
    #[must_use]
    pub const fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    /// Left edge.
    #[must_use]
    pub fn min_x(&self) -> f32 {
        self.center.x - self.size.width / 2.0
    }

    /// Right edge.
    #[must_use]
    pub fn max_x(&self) -> f32 {
        self.center.x + self.size.width / 2.0
    }

    /// Top edge.
    #[must_use]
    pub fn min_y(&self) -> f32 {
        self.center.y - self.size.height / 2.0
    }

    /// Bottom edge.
    #[must_use]
    pub fn max_y(&self) -> f32 {
        self.center.y + self.size.height / 2.0
    }

    /// Check whether a normalized-space point lies within this rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_to_surface_scales() {
        assert!(approx_eq(to_surface(0.5, 800.0), 400.0));
        assert!(approx_eq(to_surface(0.0, 800.0), 0.0));
        assert!(approx_eq(to_surface(1.0, 2048.0), 2048.0));
    }

    #[test]
    fn test_round_trip() {
        for &size in &[1.0_f32, 256.0, 800.0, 4096.0] {
            for &v in &[0.0_f32, 0.25, 0.5, 0.75, 1.0, 1.5] {
                let there_and_back = from_surface(to_surface(v, size), size);
                assert!(
                    approx_eq(there_and_back, v),
                    "round trip of {v} through size {size} gave {there_and_back}"
                );
            }
        }
    }

    #[test]
    fn test_same_normalized_point_is_proportional() {
        // A normalized coordinate maps to proportional positions on
        // surfaces of different sizes.
        let v = 0.5;
        let small = to_surface(v, 400.0);
        let large = to_surface(v, 1600.0);
        assert!(approx_eq(small / 400.0, large / 1600.0));
    }

    #[test]
    #[should_panic(expected = "surface size must be positive")]
    fn test_non_positive_size_is_a_contract_violation() {
        let _ = to_surface(0.5, 0.0);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(Point::center(), Size::new(0.5, 0.5));
        assert!(rect.contains(Point::new(0.5, 0.5)));
        assert!(rect.contains(Point::new(0.26, 0.74)));
        assert!(!rect.contains(Point::new(0.2, 0.5)));
        assert!(!rect.contains(Point::new(0.5, 0.8)));
    }

    #[test]
    fn test_rect_may_exceed_unit_range() {
        // Storage allows bounds past [0, 1]; only rendering clips.
        let rect = Rect::new(Point::new(0.9, 0.9), Size::new(0.4, 0.4));
        assert!(rect.max_x() > 1.0);
        assert!(rect.contains(Point::new(1.05, 0.95)));
    }
}
