//! # Decal Renderer
//!
//! CPU layer compositor: renders the ordered decal stack onto pixel
//! surfaces of any size from one normalized-space layer state.
//!
//! ## Render targets
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              LayerCompositor                │
//! │   layer stack + shared raster sources       │
//! ├──────────────────────┬──────────────────────┤
//! │ Interactive surface  │ Export surface(s)    │
//! │ - on-screen editing  │ - model texture      │
//! │ - selection outline  │ - consumer-identical │
//! │   and handles        │   pixels, no chrome  │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! A layer centered at normalized `(0.5, 0.5)` lands at the midpoint of
//! every target regardless of its pixel size.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod error;
pub mod raster;
pub mod surface;

pub use compositor::{surface_point_to_normalized, LayerCompositor};
pub use error::{RenderError, RenderResult};
pub use raster::RasterImage;
pub use surface::{PixelSurface, SurfaceRole};
