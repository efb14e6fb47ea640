//! Scene-object selection engine.
//!
//! Owns the set of currently selected scene objects and the single primary
//! selection, resolves pointer rays to objects through the external ray
//! caster, manages per-object selection overlays, and keeps the external
//! transform tool bound to the primary selection.
//!
//! All selection state lives on one engine instance passed by reference to
//! event handlers; there are no process-wide globals. Every operation runs
//! to completion synchronously, so the selection invariants hold at the end
//! of each pointer or keyboard handler.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::event::{SelectionChange, SelectionObserver};
use crate::scene::{
    NodeKind, ObjectId, OrbitControl, OverlayHost, OverlayId, RayCaster, SceneGraph,
    TransformTool, Vec3,
};

/// Direction for cycling the primary selection through the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    /// Move to the next candidate, wrapping at the end.
    Next,
    /// Move to the previous candidate, wrapping at the start.
    Previous,
}

/// Selection engine for a live 3D scene.
///
/// Invariants, checked by every mutating operation:
///
/// - the primary selection is `None` iff the selection set is empty,
///   otherwise it is a member of the set;
/// - every member passed the selectability filter at the moment it was
///   selected;
/// - each member has exactly one live overlay, destroyed on deselection.
///
/// When the primary member is deselected, the new primary is the most
/// recently selected remaining member.
pub struct SelectionEngine {
    scene: Arc<dyn SceneGraph>,
    raycaster: Arc<dyn RayCaster>,
    overlays: Arc<dyn OverlayHost>,
    orbit: Arc<dyn OrbitControl>,
    tool: Option<Arc<dyn TransformTool>>,

    /// Selected objects in selection order (oldest first).
    selection: Vec<ObjectId>,
    primary: Option<ObjectId>,
    visuals: HashMap<ObjectId, OverlayId>,

    /// Top-level objects eligible for picking and cycling.
    candidates: Vec<ObjectId>,
    /// Capability table resolved at refresh time; replaces a per-pick
    /// ancestor walk.
    selectable: HashSet<ObjectId>,
    /// The bound tool's own gizmo objects, excluded from picks.
    gizmo_exclusions: HashSet<ObjectId>,
    /// While true, pick resolution is suppressed and orbit is suspended.
    tool_dragging: bool,

    observers: Vec<Box<dyn SelectionObserver>>,
}

impl SelectionEngine {
    /// Create an engine wired to the external collaborators.
    #[must_use]
    pub fn new(
        scene: Arc<dyn SceneGraph>,
        raycaster: Arc<dyn RayCaster>,
        overlays: Arc<dyn OverlayHost>,
        orbit: Arc<dyn OrbitControl>,
    ) -> Self {
        Self {
            scene,
            raycaster,
            overlays,
            orbit,
            tool: None,
            selection: Vec::new(),
            primary: None,
            visuals: HashMap::new(),
            candidates: Vec::new(),
            selectable: HashSet::new(),
            gizmo_exclusions: HashSet::new(),
            tool_dragging: false,
            observers: Vec::new(),
        }
    }

    /// Subscribe an observer to selection changes.
    pub fn subscribe(&mut self, observer: Box<dyn SelectionObserver>) {
        self.observers.push(observer);
    }

    /// Currently selected objects, oldest selection first.
    #[must_use]
    pub fn selected(&self) -> &[ObjectId] {
        &self.selection
    }

    /// The primary selection, if any.
    #[must_use]
    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    /// Whether an object is currently selected.
    #[must_use]
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.contains(&id)
    }

    /// The current pick/cycle candidate list.
    #[must_use]
    pub fn candidates(&self) -> &[ObjectId] {
        &self.candidates
    }

    /// Select an object and make it primary.
    ///
    /// With `replace`, the prior selection is cleared first. Re-selecting
    /// an already-selected object only refreshes its recency and primary
    /// status; membership and overlays are untouched. Objects that did not
    /// pass the selectability filter, or that have vanished from the
    /// scene, are ignored.
    pub fn select_object(&mut self, id: ObjectId, replace: bool) {
        if !self.selectable.contains(&id) || !self.scene.contains(id) {
            tracing::debug!(object = %id, "ignoring select of non-selectable object");
            return;
        }

        if replace {
            for other in self.selection.clone() {
                if other != id {
                    self.remove_member(other);
                }
            }
        }

        if let Some(pos) = self.selection.iter().position(|&sid| sid == id) {
            // Refresh recency so primary reassignment stays deterministic.
            self.selection.remove(pos);
            self.selection.push(id);
        } else {
            self.selection.push(id);
            let overlay = self.overlays.add_overlay(id);
            self.visuals.insert(id, overlay);
            let name = self.scene.name(id).unwrap_or_default();
            self.notify(&SelectionChange::Selected { object: id, name });
        }

        self.set_primary(Some(id));
    }

    /// Select the object if absent, deselect it if present. Used for
    /// additive and subtractive picking gestures.
    pub fn toggle_object(&mut self, id: ObjectId) {
        if self.is_selected(id) {
            self.deselect_object(Some(id));
        } else {
            self.select_object(id, false);
        }
    }

    /// Select every object between `a` and `b` (inclusive) in the supplied
    /// ordered list, clearing the prior selection first. `b` becomes
    /// primary. A no-op if either endpoint is absent from the list.
    pub fn select_range(&mut self, a: ObjectId, b: ObjectId, ordered: &[ObjectId]) {
        let Some(pos_a) = ordered.iter().position(|&id| id == a) else {
            return;
        };
        let Some(pos_b) = ordered.iter().position(|&id| id == b) else {
            return;
        };

        self.deselect_all();
        let (lo, hi) = if pos_a <= pos_b {
            (pos_a, pos_b)
        } else {
            (pos_b, pos_a)
        };
        for &id in &ordered[lo..=hi] {
            self.select_object(id, false);
        }
        if self.is_selected(b) {
            self.set_primary(Some(b));
        }
    }

    /// Deselect an object, or the primary selection when `id` is `None`.
    ///
    /// Destroys the object's overlay and, if it was primary, promotes the
    /// most recently selected remaining member. A no-op for objects that
    /// are not selected.
    pub fn deselect_object(&mut self, id: Option<ObjectId>) {
        let Some(target) = id.or(self.primary) else {
            return;
        };
        if !self.is_selected(target) {
            return;
        }

        let was_primary = self.primary == Some(target);
        self.remove_member(target);
        if was_primary {
            self.set_primary(self.selection.last().copied());
        }
    }

    /// Empty the selection set, destroy every overlay, and detach the
    /// transform tool.
    pub fn deselect_all(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        for id in std::mem::take(&mut self.selection) {
            if let Some(overlay) = self.visuals.remove(&id) {
                self.overlays.remove_overlay(overlay);
            }
        }
        self.notify(&SelectionChange::Cleared);
        self.set_primary(None);
    }

    /// Delete every selected object: deselect it, then request its removal
    /// and resource release from the scene graph. Objects whose resources
    /// are already released are tolerated as no-ops.
    pub fn delete_selected(&mut self) {
        let doomed: Vec<ObjectId> = self.selection.clone();
        for id in doomed {
            self.deselect_object(Some(id));
            if !self.scene.remove(id) {
                tracing::debug!(object = %id, "scene object already released");
            }
        }
    }

    /// Resolve a pointer ray to a selectable scene object.
    ///
    /// Delegates to the external ray caster restricted to the candidate
    /// list, discards hits on the transform tool's own gizmo, and maps the
    /// nearest remaining hit to its selectable ancestor. Yields `None`
    /// while a tool drag is in progress, and for empty or stale candidate
    /// lists.
    #[must_use]
    pub fn resolve_pick(&self, origin: Vec3, direction: Vec3) -> Option<ObjectId> {
        if self.tool_dragging {
            return None;
        }
        if self.candidates.is_empty() {
            return None;
        }

        let hits = self.raycaster.cast(origin, direction, &self.candidates);
        let hit = hits.iter().find(|hit| !self.is_gizmo_hit(hit.object))?;
        let resolved = self.selectable_ancestor(hit.object);
        if let Some(id) = resolved {
            tracing::debug!(object = %id, distance = hit.distance, "pick resolved");
        }
        resolved
    }

    /// Move the primary selection to the adjacent candidate, wrapping at
    /// both ends, and replace the whole selection with it.
    pub fn cycle(&mut self, direction: CycleDirection) {
        if self.candidates.is_empty() {
            return;
        }
        let len = self.candidates.len();
        let current = self
            .primary
            .and_then(|p| self.candidates.iter().position(|&id| id == p));
        let next = match (direction, current) {
            (CycleDirection::Next, Some(i)) => (i + 1) % len,
            (CycleDirection::Previous, Some(i)) => (i + len - 1) % len,
            (CycleDirection::Next, None) => 0,
            (CycleDirection::Previous, None) => len - 1,
        };
        self.select_object(self.candidates[next], true);
    }

    /// Recompute the candidate list and capability table from the scene's
    /// direct children.
    ///
    /// Lights, helpers, gizmos, and anything explicitly marked
    /// non-selectable are excluded; only composite nodes that transitively
    /// contain a drawable primitive are kept. Selected objects that have
    /// vanished from the scene are dropped here as well.
    pub fn refresh_selectable_objects(&mut self) {
        let children = self.scene.children();
        self.candidates.clear();
        self.selectable.clear();

        for node in &children {
            if matches!(node.kind, NodeKind::Light | NodeKind::Helper | NodeKind::Gizmo) {
                continue;
            }
            if node.selectable == Some(false) || !node.has_drawable {
                continue;
            }
            self.candidates.push(node.id);
            self.selectable.insert(node.id);
        }

        let vanished: Vec<ObjectId> = self
            .selection
            .iter()
            .copied()
            .filter(|&id| !self.scene.contains(id))
            .collect();
        for id in vanished {
            self.deselect_object(Some(id));
        }

        tracing::debug!(candidates = self.candidates.len(), "candidate list refreshed");
    }

    /// Bind the external transform tool. Its gizmo objects become the pick
    /// exclusion set, and it is attached to the current primary selection.
    pub fn bind_transform_tool(&mut self, tool: Arc<dyn TransformTool>) {
        self.gizmo_exclusions = tool.gizmo_objects().into_iter().collect();
        self.tool_dragging = tool.is_dragging();
        self.tool = Some(tool);
        self.orbit.set_enabled(!self.tool_dragging);
        self.sync_tool();
    }

    /// Unbind the transform tool, detaching it first.
    pub fn unbind_transform_tool(&mut self) {
        if let Some(tool) = self.tool.take() {
            tool.detach();
        }
        self.gizmo_exclusions.clear();
        if self.tool_dragging {
            self.tool_dragging = false;
            self.orbit.set_enabled(true);
        }
    }

    /// Forward the transform tool's dragging signal.
    ///
    /// While dragging, pick resolution is suppressed and the camera-orbit
    /// control is suspended; both are restored when the drag ends.
    pub fn set_tool_dragging(&mut self, dragging: bool) {
        if dragging == self.tool_dragging {
            return;
        }
        self.tool_dragging = dragging;
        self.orbit.set_enabled(!dragging);
    }

    fn is_gizmo_hit(&self, mut id: ObjectId) -> bool {
        loop {
            if self.gizmo_exclusions.contains(&id) {
                return true;
            }
            match self.scene.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Nearest ancestor (inclusive) of a hit that is a pick candidate.
    fn selectable_ancestor(&self, mut id: ObjectId) -> Option<ObjectId> {
        loop {
            if self.selectable.contains(&id) {
                return Some(id);
            }
            id = self.scene.parent(id)?;
        }
    }

    /// Drop a member from the set and destroy its overlay.
    fn remove_member(&mut self, id: ObjectId) {
        let Some(pos) = self.selection.iter().position(|&sid| sid == id) else {
            return;
        };
        self.selection.remove(pos);
        if let Some(overlay) = self.visuals.remove(&id) {
            self.overlays.remove_overlay(overlay);
        }
        self.notify(&SelectionChange::Deselected { object: id });
    }

    fn set_primary(&mut self, primary: Option<ObjectId>) {
        if self.primary == primary {
            self.sync_tool();
            return;
        }
        self.primary = primary;
        self.notify(&SelectionChange::PrimaryChanged { object: primary });
        self.sync_tool();
    }

    /// Keep the transform tool attached to the primary selection.
    fn sync_tool(&self) {
        if let Some(tool) = &self.tool {
            match self.primary {
                Some(id) => tool.attach(id),
                None => tool.detach(),
            }
        }
    }

    fn notify(&self, change: &SelectionChange) {
        for observer in &self.observers {
            observer.selection_changed(change);
        }
    }
}

impl Drop for SelectionEngine {
    fn drop(&mut self) {
        for (_, overlay) in self.visuals.drain() {
            self.overlays.remove_overlay(overlay);
        }
    }
}
