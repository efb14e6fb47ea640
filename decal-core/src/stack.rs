//! Ordered layer stack with z-order mutation and hit testing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coords::Point;
use crate::error::{CoreError, CoreResult};
use crate::layer::{ImageLayer, LayerId};

/// An ordered stack of image layers.
///
/// The sequence defines back-to-front z-order: the first entry is the
/// bottommost layer. The identifier map and the sequence always cover
/// exactly the same set of layers, and at most one layer carries the
/// selection flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStack {
    /// All layers, indexed by ID.
    layers: HashMap<LayerId, ImageLayer>,
    /// Back-to-front z-order.
    order: Vec<LayerId>,
    /// Currently selected layer, if any.
    selected: Option<LayerId>,
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer at the top of the z-order and make it the sole
    /// selected layer. Returns its identifier.
    pub fn push(&mut self, layer: ImageLayer) -> LayerId {
        let id = layer.id;
        self.order.push(id);
        self.layers.insert(id, layer);
        self.select(id);
        id
    }

    /// Remove a layer and its z-order entry.
    ///
    /// If it was selected, the selection becomes empty. Absent identifiers
    /// are a no-op, not an error.
    pub fn remove(&mut self, id: LayerId) -> Option<ImageLayer> {
        let layer = self.layers.remove(&id)?;
        self.order.retain(|&lid| lid != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(layer)
    }

    /// Swap a layer with the one above it. No-op at the top boundary or
    /// for absent identifiers. Returns whether the order changed.
    pub fn move_up(&mut self, id: LayerId) -> bool {
        match self.order.iter().position(|&lid| lid == id) {
            Some(pos) if pos + 1 < self.order.len() => {
                self.order.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Swap a layer with the one below it. No-op at the bottom boundary or
    /// for absent identifiers. Returns whether the order changed.
    pub fn move_down(&mut self, id: LayerId) -> bool {
        match self.order.iter().position(|&lid| lid == id) {
            Some(pos) if pos > 0 => {
                self.order.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// The topmost visible layer whose axis-aligned bounds contain
    /// `point`, both in normalized space. Rotation does not affect the
    /// tested bounds.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.layers.get(id))
            .find(|layer| layer.visible && layer.bounds().contains(point))
            .map(|layer| layer.id)
    }

    /// Make `id` the sole selected layer. Returns false (leaving the
    /// current selection intact) if the layer is absent.
    pub fn select(&mut self, id: LayerId) -> bool {
        if !self.layers.contains_key(&id) {
            return false;
        }
        if let Some(prev) = self.selected.take() {
            if let Some(layer) = self.layers.get_mut(&prev) {
                layer.selected = false;
            }
        }
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.selected = true;
        }
        self.selected = Some(id);
        true
    }

    /// Clear the layer selection.
    pub fn clear_selection(&mut self) {
        if let Some(prev) = self.selected.take() {
            if let Some(layer) = self.layers.get_mut(&prev) {
                layer.selected = false;
            }
        }
    }

    /// The currently selected layer, if any.
    #[must_use]
    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&ImageLayer> {
        self.layers.get(&id)
    }

    /// Get a mutable reference to a layer by ID.
    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut ImageLayer> {
        self.layers.get_mut(&id)
    }

    /// Identifiers in back-to-front order.
    #[must_use]
    pub fn ids(&self) -> &[LayerId] {
        &self.order
    }

    /// Layers in back-to-front order.
    pub fn iter_bottom_up(&self) -> impl Iterator<Item = &ImageLayer> {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    /// Number of layers in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Serialize a read-only snapshot for external persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Deserialize a snapshot, validating stack invariants.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON, on a mismatch between the
    /// z-order sequence and the layer map, or on an out-of-map selection.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let stack: Self = serde_json::from_str(json).map_err(CoreError::Serialization)?;
        if stack.order.len() != stack.layers.len()
            || !stack.order.iter().all(|id| stack.layers.contains_key(id))
        {
            return Err(CoreError::InvalidOperation(
                "layer order and layer map disagree".to_string(),
            ));
        }
        if let Some(sel) = stack.selected {
            if !stack.layers.contains_key(&sel) {
                return Err(CoreError::InvalidOperation(
                    "selected layer is not in the stack".to_string(),
                ));
            }
        }
        Ok(stack)
    }
}
