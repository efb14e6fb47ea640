//! Scene-object handles and the collaborator seams to the external 3D
//! renderer.
//!
//! The scene graph, ray casting, selection overlays, transform tool, and
//! camera-orbit control all live in the embedding renderer. This module
//! defines the narrow traits through which the selection engine consumes
//! them; the engine never reaches past these boundaries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle to a node in the external scene graph.
///
/// Identity is stable for the node's lifetime; the node itself is owned by
/// the renderer and may disappear between a pick resolution and the next
/// state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Mint a new object ID.
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

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a selection overlay created by the [`OverlayHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayId(Uuid);

impl OverlayId {
    /// Mint a new overlay ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

/// A 3D vector for ray origins and directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Coarse classification of a scene node, used when filtering pick
/// candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A drawable mesh.
    Mesh,
    /// A composite node that may contain drawable descendants.
    Group,
    /// A light source.
    Light,
    /// A non-scene helper (grids, axes, measurement aids).
    Helper,
    /// Part of a manipulation gizmo.
    Gizmo,
}

/// Descriptor for a direct child of the scene root, supplied by the
/// [`SceneGraph`] collaborator when the candidate list is refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNodeDesc {
    /// Stable identity of the node.
    pub id: ObjectId,
    /// Display name, surfaced to UI panels on selection.
    pub name: String,
    /// Coarse node classification.
    pub kind: NodeKind,
    /// Explicit selectability declaration, if the node carries one.
    /// Nodes without a declaration anywhere in their ancestry are not
    /// selectable.
    pub selectable: Option<bool>,
    /// Whether the node transitively contains at least one drawable
    /// primitive.
    pub has_drawable: bool,
}

/// A single ray intersection reported by the external ray caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The hit scene object; may be a nested descendant of a candidate.
    pub object: ObjectId,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Read and mutate access to the external scene graph.
pub trait SceneGraph: Send + Sync {
    /// Direct children of the scene root.
    fn children(&self) -> Vec<SceneNodeDesc>;

    /// Parent of a node, or `None` at the root or for vanished nodes.
    fn parent(&self, id: ObjectId) -> Option<ObjectId>;

    /// Whether the node is still present in the scene.
    fn contains(&self, id: ObjectId) -> bool;

    /// Remove a node and release its resources. Returns false if the node
    /// (or its resources) were already gone; callers treat that as a
    /// no-op.
    fn remove(&self, id: ObjectId) -> bool;

    /// Display name of a node, if it is still present.
    fn name(&self, id: ObjectId) -> Option<String>;
}

/// Ray-intersection primitive exposed by the external renderer.
pub trait RayCaster: Send + Sync {
    /// Intersect a ray against the given candidate objects (including
    /// their descendants), returning hits ordered nearest-first.
    fn cast(&self, origin: Vec3, direction: Vec3, candidates: &[ObjectId]) -> Vec<RayHit>;
}

/// Owner of per-object selection overlays (wireframes or highlights).
pub trait OverlayHost: Send + Sync {
    /// Create an overlay attached to `target` and return its handle.
    fn add_overlay(&self, target: ObjectId) -> OverlayId;

    /// Destroy an overlay. Tolerates handles whose target has vanished.
    fn remove_overlay(&self, id: OverlayId);
}

/// The external transform tool bound to the primary selection.
pub trait TransformTool: Send + Sync {
    /// Attach the tool to a scene object.
    fn attach(&self, target: ObjectId);

    /// Detach the tool from whatever it is attached to.
    fn detach(&self);

    /// Whether the user is currently dragging one of the tool's handles.
    fn is_dragging(&self) -> bool;

    /// The tool's own gizmo sub-objects, excluded from pick resolution.
    fn gizmo_objects(&self) -> Vec<ObjectId>;
}

/// Enable/disable toggle for the external camera-orbit control.
pub trait OrbitControl: Send + Sync {
    /// Enable or disable orbiting.
    fn set_enabled(&self, enabled: bool);
}
