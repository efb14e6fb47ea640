//! Error types for compositing operations.

use thiserror::Error;

/// Result type for compositing operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading rasters or compositing.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Raster source could not be decoded.
    #[error("Failed to load raster source: {0}")]
    Source(String),

    /// Compositing failed.
    #[error("Compositing error: {0}")]
    Composite(String),
}
