//! # Decal Core
//!
//! Core editor logic for composing raster decals onto a 3D model's
//! surface: the resolution-independent coordinate model, the ordered layer
//! stack, and the scene-object selection engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                decal-core                   │
//! ├──────────────────────┬──────────────────────┤
//! │  Layer Stack         │  Selection Engine    │
//! │  - normalized space  │  - pick resolution   │
//! │  - z-order           │  - primary binding   │
//! │  - hit testing       │  - overlay lifecycle │
//! ├──────────────────────┴──────────────────────┤
//! │  Collaborator seams (traits)                │
//! │  scene graph · ray caster · transform tool  │
//! │  orbit control · overlay host               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The external 3D renderer, transform tool, and camera controls are
//! consumed through the traits in [`scene`]; nothing here renders a frame
//! itself.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coords;
pub mod error;
pub mod event;
pub mod layer;
pub mod scene;
pub mod selection;
pub mod stack;

pub use coords::{Point, Rect, Size};
pub use error::{CoreError, CoreResult};
pub use event::{LayerChange, LayerInfo, LayerObserver, SelectionChange, SelectionObserver};
pub use layer::{ImageLayer, LayerId, Placement};
pub use scene::{
    NodeKind, ObjectId, OrbitControl, OverlayHost, OverlayId, RayCaster, RayHit, SceneGraph,
    SceneNodeDesc, TransformTool, Vec3,
};
pub use selection::{CycleDirection, SelectionEngine};
pub use stack::LayerStack;

/// Decal core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
