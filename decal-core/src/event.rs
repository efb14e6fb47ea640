//! Change notifications for UI collaborators.
//!
//! Selection and layer mutations are reported through explicit observer
//! traits rather than an event-dispatcher base class. Observers run
//! synchronously within the mutating call, so state is always consistent
//! when a notification is observed.

use serde::{Deserialize, Serialize};

use crate::coords::{Point, Size};
use crate::layer::LayerId;
use crate::scene::ObjectId;

/// A change to the scene-object selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SelectionChange {
    /// An object entered the selection set.
    Selected {
        /// The selected object.
        object: ObjectId,
        /// Display name for UI panels.
        name: String,
    },

    /// An object left the selection set.
    Deselected {
        /// The deselected object.
        object: ObjectId,
    },

    /// The primary selection moved.
    PrimaryChanged {
        /// New primary, or `None` when the selection emptied.
        object: Option<ObjectId>,
    },

    /// The whole selection was cleared at once.
    Cleared,
}

/// Observer of selection changes.
pub trait SelectionObserver: Send + Sync {
    /// Called after the selection state has been updated.
    fn selection_changed(&self, change: &SelectionChange);
}

impl<F> SelectionObserver for F
where
    F: Fn(&SelectionChange) + Send + Sync,
{
    fn selection_changed(&self, change: &SelectionChange) {
        self(change);
    }
}

/// Summary of a layer for UI panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Layer identifier.
    pub id: LayerId,
    /// Center in normalized space.
    pub center: Point,
    /// Extents in normalized space.
    pub size: Size,
}

/// A change to the layer stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LayerChange {
    /// A layer was appended at the top of the stack.
    Added {
        /// The new layer.
        layer: LayerInfo,
    },

    /// A layer was removed.
    Removed {
        /// The removed layer's identifier.
        id: LayerId,
    },

    /// A layer's geometry or appearance changed.
    Updated {
        /// The updated layer.
        layer: LayerInfo,
    },

    /// The z-order changed.
    Reordered {
        /// New back-to-front order.
        order: Vec<LayerId>,
    },

    /// The selected layer changed.
    SelectionChanged {
        /// Newly selected layer, or `None`.
        id: Option<LayerId>,
    },
}

/// Observer of layer-stack changes.
pub trait LayerObserver: Send + Sync {
    /// Called after the layer stack has been updated.
    fn layer_changed(&self, change: &LayerChange);
}

impl<F> LayerObserver for F
where
    F: Fn(&LayerChange) + Send + Sync,
{
    fn layer_changed(&self, change: &LayerChange) {
        self(change);
    }
}
