//! Layer compositor.
//!
//! Owns the ordered layer stack and the shared raster sources, and renders
//! them onto any number of pixel surfaces. Geometry is stored in
//! normalized space, so the same stack produces geometrically consistent
//! output on targets of different pixel sizes.

use std::collections::HashMap;
use std::sync::Arc;

use decal_core::coords::{from_surface, to_surface, Point, Size};
use decal_core::{ImageLayer, LayerChange, LayerId, LayerInfo, LayerObserver, LayerStack, Placement};

use crate::raster::RasterImage;
use crate::surface::{PixelSurface, SurfaceRole};

/// Fixed background every render starts from.
const BACKGROUND: [u8; 4] = [236, 236, 236, 255];

/// Accent color for the selection outline and handles.
const SELECTION_COLOR: [u8; 4] = [64, 132, 244, 255];

/// Outline stroke thickness in pixels.
const OUTLINE_THICKNESS: u32 = 2;

/// Side length of a resize handle in pixels.
const HANDLE_SIZE: u32 = 7;

/// Smallest normalized extent a layer can be resized to.
const MIN_LAYER_EXTENT: f32 = 0.01;

/// Compositor for an ordered stack of image layers.
///
/// All operations are total over well-formed input; operations referencing
/// an absent layer are silent no-ops, since layer deletion races with UI
/// commands are routine.
pub struct LayerCompositor {
    stack: LayerStack,
    sources: HashMap<LayerId, Arc<RasterImage>>,
    observers: Vec<Box<dyn LayerObserver>>,
}

impl LayerCompositor {
    /// Create an empty compositor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: LayerStack::new(),
            sources: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Subscribe an observer to layer-stack changes.
    pub fn subscribe(&mut self, observer: Box<dyn LayerObserver>) {
        self.observers.push(observer);
    }

    /// Append a layer for `source` at the top of the z-order and select
    /// it. Without an explicit placement the layer is centered with its
    /// larger dimension capped at 75% of normalized space.
    pub fn add_layer(&mut self, source: Arc<RasterImage>, placement: Option<Placement>) -> LayerId {
        let placement =
            placement.unwrap_or_else(|| Placement::fitted(source.width(), source.height()));
        let layer = ImageLayer::new(source.width(), source.height(), placement);
        let info = layer_info(&layer);
        let id = self.stack.push(layer);
        self.sources.insert(id, source);
        tracing::debug!(layer = %id, "layer added");
        self.notify(&LayerChange::Added { layer: info });
        self.notify(&LayerChange::SelectionChanged { id: Some(id) });
        id
    }

    /// Remove a layer and its raster source. If it was selected the
    /// selection becomes empty. Absent identifiers are a no-op.
    pub fn remove_layer(&mut self, id: LayerId) {
        let was_selected = self.stack.selected() == Some(id);
        if self.stack.remove(id).is_none() {
            return;
        }
        self.sources.remove(&id);
        self.notify(&LayerChange::Removed { id });
        if was_selected {
            self.notify(&LayerChange::SelectionChanged { id: None });
        }
    }

    /// Swap a layer with the one above it; no-op at the top of the stack.
    pub fn move_layer_up(&mut self, id: LayerId) {
        if self.stack.move_up(id) {
            self.notify_reordered();
        }
    }

    /// Swap a layer with the one below it; no-op at the bottom of the
    /// stack.
    pub fn move_layer_down(&mut self, id: LayerId) {
        if self.stack.move_down(id) {
            self.notify_reordered();
        }
    }

    /// The topmost visible layer whose axis-aligned bounds contain the
    /// normalized-space point.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.stack.hit_test(point)
    }

    /// Make a layer the sole selected layer. Absent identifiers are a
    /// no-op.
    pub fn select_layer(&mut self, id: LayerId) {
        if self.stack.selected() == Some(id) {
            return;
        }
        if self.stack.select(id) {
            self.notify(&LayerChange::SelectionChanged { id: Some(id) });
        }
    }

    /// Clear the layer selection.
    pub fn clear_layer_selection(&mut self) {
        if self.stack.selected().is_some() {
            self.stack.clear_selection();
            self.notify(&LayerChange::SelectionChanged { id: None });
        }
    }

    /// The currently selected layer, if any.
    #[must_use]
    pub fn selected_layer(&self) -> Option<LayerId> {
        self.stack.selected()
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&ImageLayer> {
        self.stack.get(id)
    }

    /// Read-only view of the stack, for persistence snapshots.
    #[must_use]
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Move a layer's center.
    pub fn set_layer_center(&mut self, id: LayerId, center: Point) {
        self.update_layer(id, |layer| layer.center = center);
    }

    /// Resize a layer. Extents are clamped to a small positive minimum so
    /// interactive resize drags can never collapse a layer.
    pub fn set_layer_size(&mut self, id: LayerId, size: Size) {
        self.update_layer(id, |layer| {
            layer.size = Size::new(
                size.width.max(MIN_LAYER_EXTENT),
                size.height.max(MIN_LAYER_EXTENT),
            );
        });
    }

    /// Rotate a layer about its center, in radians.
    pub fn set_layer_rotation(&mut self, id: LayerId, rotation: f32) {
        self.update_layer(id, |layer| layer.rotation = rotation);
    }

    /// Set a layer's opacity, clamped into `[0, 1]`.
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) {
        self.update_layer(id, |layer| layer.set_opacity(opacity));
    }

    /// Show or hide a layer.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) {
        self.update_layer(id, |layer| layer.visible = visible);
    }

    /// Render the stack onto a surface.
    ///
    /// Clears the target to the fixed background, then draws every visible
    /// layer bottom-to-top with its position, rotation, and opacity scaled
    /// to the target's pixel size. The selection outline and resize
    /// handles are drawn only on [`SurfaceRole::Interactive`] surfaces;
    /// export renders stay uncontaminated by editing affordances.
    pub fn render(&self, surface: &mut PixelSurface) {
        surface.clear(BACKGROUND);
        for layer in self.stack.iter_bottom_up() {
            if !layer.visible || layer.opacity <= 0.0 {
                continue;
            }
            let Some(source) = self.sources.get(&layer.id) else {
                continue;
            };
            draw_layer(surface, layer, source);
        }

        if surface.role() == SurfaceRole::Interactive {
            if let Some(selected) = self.stack.selected().and_then(|id| self.stack.get(id)) {
                if selected.visible {
                    draw_selection_decoration(surface, selected);
                }
            }
        }
    }

    fn update_layer(&mut self, id: LayerId, mutate: impl FnOnce(&mut ImageLayer)) {
        let Some(layer) = self.stack.get_mut(id) else {
            return;
        };
        mutate(layer);
        let info = layer_info(layer);
        self.notify(&LayerChange::Updated { layer: info });
    }

    fn notify_reordered(&self) {
        self.notify(&LayerChange::Reordered {
            order: self.stack.ids().to_vec(),
        });
    }

    fn notify(&self, change: &LayerChange) {
        for observer in &self.observers {
            observer.layer_changed(change);
        }
    }
}

impl Default for LayerCompositor {
    fn default() -> Self {
        Self::new()
    }
}

fn layer_info(layer: &ImageLayer) -> LayerInfo {
    LayerInfo {
        id: layer.id,
        center: layer.center,
        size: layer.size,
    }
}

/// Draw one layer onto the surface, scaled through the coordinate model.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn draw_layer(surface: &mut PixelSurface, layer: &ImageLayer, source: &RasterImage) {
    let sw = surface.width() as f32;
    let sh = surface.height() as f32;

    let cx = to_surface(layer.center.x, sw);
    let cy = to_surface(layer.center.y, sh);
    let w = to_surface(layer.size.width, sw);
    let h = to_surface(layer.size.height, sh);
    if w < 1.0 || h < 1.0 {
        return;
    }

    let (sin, cos) = layer.rotation.sin_cos();

    // Pixel bounds of the rotated rectangle, clipped to the surface.
    let extent_x = (w * cos.abs() + h * sin.abs()) / 2.0;
    let extent_y = (w * sin.abs() + h * cos.abs()) / 2.0;
    let x0 = (cx - extent_x).floor().max(0.0) as u32;
    let y0 = (cy - extent_y).floor().max(0.0) as u32;
    let x1 = ((cx + extent_x).ceil() as u32).min(surface.width());
    let y1 = ((cy + extent_y).ceil() as u32).min(surface.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            // Rotate the destination offset back into layer-local space.
            let lx = dx * cos + dy * sin;
            let ly = -dx * sin + dy * cos;
            let u = lx / w + 0.5;
            let v = ly / h + 0.5;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }
            let rgba = source.sample(u * source.width() as f32, v * source.height() as f32);
            surface.blend_pixel(px, py, rgba, layer.opacity);
        }
    }
}

/// Draw the selection outline and resize handles around a layer's
/// axis-aligned bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn draw_selection_decoration(surface: &mut PixelSurface, layer: &ImageLayer) {
    let sw = surface.width() as f32;
    let sh = surface.height() as f32;
    let bounds = layer.bounds();

    let x0 = to_surface(bounds.min_x(), sw).round() as i64;
    let y0 = to_surface(bounds.min_y(), sh).round() as i64;
    let x1 = to_surface(bounds.max_x(), sw).round() as i64;
    let y1 = to_surface(bounds.max_y(), sh).round() as i64;

    let t = i64::from(OUTLINE_THICKNESS);
    fill_rect(surface, x0, y0, x1, y0 + t, SELECTION_COLOR);
    fill_rect(surface, x0, y1 - t, x1, y1, SELECTION_COLOR);
    fill_rect(surface, x0, y0, x0 + t, y1, SELECTION_COLOR);
    fill_rect(surface, x1 - t, y0, x1, y1, SELECTION_COLOR);

    let mid_x = (x0 + x1) / 2;
    let mid_y = (y0 + y1) / 2;
    let anchors = [
        (x0, y0),
        (mid_x, y0),
        (x1, y0),
        (x0, mid_y),
        (x1, mid_y),
        (x0, y1),
        (mid_x, y1),
        (x1, y1),
    ];
    let half = i64::from(HANDLE_SIZE / 2);
    for (hx, hy) in anchors {
        fill_rect(
            surface,
            hx - half,
            hy - half,
            hx + half + 1,
            hy + half + 1,
            SELECTION_COLOR,
        );
    }
}

/// Fill a half-open pixel rectangle, clipped to the surface.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_rect(surface: &mut PixelSurface, x0: i64, y0: i64, x1: i64, y1: i64, rgba: [u8; 4]) {
    let x0 = x0.max(0) as u32;
    let y0 = y0.max(0) as u32;
    let x1 = x1.clamp(0, i64::from(surface.width())) as u32;
    let y1 = y1.clamp(0, i64::from(surface.height())) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            surface.set_pixel(x, y, rgba);
        }
    }
}

/// Locate a surface pixel back in normalized space. Convenience for
/// pointer handling on the interactive surface.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn surface_point_to_normalized(surface: &PixelSurface, x: f32, y: f32) -> Point {
    Point::new(
        from_surface(x, surface.width() as f32),
        from_surface(y, surface.height() as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_source(rgba: [u8; 4]) -> Arc<RasterImage> {
        Arc::new(RasterImage::solid(100, 100, rgba))
    }

    /// Centroid of pixels matching a predicate.
    fn centroid(surface: &PixelSurface, pred: impl Fn([u8; 4]) -> bool) -> Option<(f32, f32)> {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0.0;
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                if pred(surface.pixel(x, y)) {
                    sum_x += x as f32;
                    sum_y += y as f32;
                    count += 1.0;
                }
            }
        }
        (count > 0.0).then(|| (sum_x / count, sum_y / count))
    }

    fn is_reddish(p: [u8; 4]) -> bool {
        p[0] > 200 && p[1] < 100
    }

    #[test]
    fn test_add_layer_default_placement() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([255, 0, 0, 255]), None);

        let layer = compositor.layer(id).expect("layer exists");
        assert_eq!(layer.center, Point::center());
        assert!((layer.size.width - 0.75).abs() < 1e-6);
        assert_eq!(compositor.selected_layer(), Some(id));
    }

    #[test]
    fn test_add_layer_reselects() {
        let mut compositor = LayerCompositor::new();
        let a = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        let b = compositor.add_layer(solid_source([0, 255, 0, 255]), None);
        assert_eq!(compositor.selected_layer(), Some(b));
        assert!(!compositor.layer(a).unwrap().selected);
        assert_eq!(compositor.stack().ids(), &[a, b]);
    }

    #[test]
    fn test_remove_layer_absent_is_noop() {
        let mut compositor = LayerCompositor::new();
        let a = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.remove_layer(LayerId::new());
        assert_eq!(compositor.stack().len(), 1);
        compositor.remove_layer(a);
        assert_eq!(compositor.stack().len(), 0);
        assert_eq!(compositor.selected_layer(), None);
    }

    #[test]
    fn test_hit_test_topmost_of_overlapping() {
        let mut compositor = LayerCompositor::new();
        let _a = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        let b = compositor.add_layer(solid_source([0, 255, 0, 255]), None);
        assert_eq!(compositor.hit_test(Point::center()), Some(b));
    }

    #[test]
    fn test_render_centroid_is_proportional_across_surfaces() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.set_layer_center(id, Point::new(0.4, 0.6));
        compositor.set_layer_size(id, Size::new(0.3, 0.2));
        compositor.clear_layer_selection();

        let mut small = PixelSurface::new(100, 100, SurfaceRole::Export);
        let mut large = PixelSurface::new(200, 400, SurfaceRole::Export);
        compositor.render(&mut small);
        compositor.render(&mut large);

        let (sx, sy) = centroid(&small, is_reddish).expect("layer drawn");
        let (lx, ly) = centroid(&large, is_reddish).expect("layer drawn");
        assert!((sx / 100.0 - lx / 200.0).abs() < 0.01);
        assert!((sy / 100.0 - ly / 400.0).abs() < 0.01);
        assert!((sx / 100.0 - 0.4).abs() < 0.01);
        assert!((sy / 100.0 - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_render_respects_z_order() {
        let mut compositor = LayerCompositor::new();
        let _red = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        let green = compositor.add_layer(solid_source([0, 255, 0, 255]), None);
        compositor.clear_layer_selection();

        let mut surface = PixelSurface::new(64, 64, SurfaceRole::Export);
        compositor.render(&mut surface);
        assert_eq!(surface.pixel(32, 32), [0, 255, 0, 255]);

        compositor.move_layer_down(green);
        compositor.render(&mut surface);
        assert_eq!(surface.pixel(32, 32), [255, 0, 0, 255]);
    }

    #[test]
    fn test_render_blends_opacity() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.set_layer_opacity(id, 0.5);
        compositor.clear_layer_selection();

        let mut surface = PixelSurface::new(64, 64, SurfaceRole::Export);
        compositor.render(&mut surface);
        let center = surface.pixel(32, 32);
        // Halfway between the red layer and the fixed background.
        assert!(center[0] > 240 && center[0] < 250);
        assert!(center[1] > 110 && center[1] < 125);
    }

    #[test]
    fn test_render_skips_hidden_layers() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.set_layer_visible(id, false);
        compositor.clear_layer_selection();

        let mut surface = PixelSurface::new(32, 32, SurfaceRole::Export);
        compositor.render(&mut surface);
        assert_eq!(surface.pixel(16, 16), BACKGROUND);
    }

    #[test]
    fn test_render_rotation_quarter_turn() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.set_layer_size(id, Size::new(0.5, 0.25));
        compositor.set_layer_rotation(id, std::f32::consts::FRAC_PI_2);
        compositor.clear_layer_selection();

        let mut surface = PixelSurface::new(100, 100, SurfaceRole::Export);
        compositor.render(&mut surface);
        // A quarter turn swaps the extents: tall now, not wide.
        assert!(is_reddish(surface.pixel(50, 70)));
        assert!(!is_reddish(surface.pixel(70, 50)));
    }

    #[test]
    fn test_export_render_is_free_of_selection_decoration() {
        let mut compositor = LayerCompositor::new();
        let id = compositor.add_layer(solid_source([0, 200, 0, 255]), None);
        assert_eq!(compositor.selected_layer(), Some(id));

        let mut export = PixelSurface::new(120, 120, SurfaceRole::Export);
        compositor.render(&mut export);
        let selected_bytes = export.as_bytes().to_vec();

        compositor.clear_layer_selection();
        compositor.render(&mut export);
        // Selection state must not leak into export output.
        assert_eq!(export.as_bytes(), &selected_bytes[..]);

        compositor.select_layer(id);
        let mut interactive = PixelSurface::new(120, 120, SurfaceRole::Interactive);
        compositor.render(&mut interactive);
        let has_accent = (0..120).any(|y| {
            (0..120).any(|x| interactive.pixel(x, y) == SELECTION_COLOR)
        });
        assert!(has_accent, "interactive render carries the outline");
    }

    #[test]
    fn test_surface_point_round_trips_to_normalized() {
        let surface = PixelSurface::new(200, 100, SurfaceRole::Interactive);
        let point = surface_point_to_normalized(&surface, 100.0, 50.0);
        assert!((point.x - 0.5).abs() < 1e-6);
        assert!((point.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_observers_see_stack_changes() {
        use std::sync::Mutex;

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();

        let mut compositor = LayerCompositor::new();
        compositor.subscribe(Box::new(move |change: &LayerChange| {
            sink.lock().unwrap().push(change.clone());
        }));

        let a = compositor.add_layer(solid_source([255, 0, 0, 255]), None);
        compositor.remove_layer(a);

        let events = log.lock().unwrap();
        assert!(matches!(&events[0], LayerChange::Added { layer } if layer.id == a));
        assert!(matches!(
            &events[1],
            LayerChange::SelectionChanged { id: Some(id) } if *id == a
        ));
        assert!(matches!(&events[2], LayerChange::Removed { id } if *id == a));
        assert!(matches!(&events[3], LayerChange::SelectionChanged { id: None }));
    }
}
