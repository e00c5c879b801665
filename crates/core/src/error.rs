//! Error types for the contour-art core.

use thiserror::Error;

/// Errors produced by field construction, configuration and engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero when creating a field or grid.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// Two grids had incompatible dimensions for an element-wise operation.
    #[error("dimension mismatch: ({lhs_w}, {lhs_h}) vs ({rhs_w}, {rhs_h})")]
    DimensionMismatch {
        lhs_w: usize,
        lhs_h: usize,
        rhs_w: usize,
        rhs_h: usize,
    },

    /// The pixel source has no drawable area, so no field can be built from it.
    #[error("pixel source has zero drawable area; no field available")]
    EmptyPixelSource,

    /// An engine was constructed without any source images.
    #[error("at least one source image is required")]
    NoSourceImages,

    /// A source image index was outside the loaded image list.
    #[error("image index {index} out of range for {len} loaded images")]
    ImageIndexOutOfRange { index: usize, len: usize },

    /// A configuration value failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An engine name was not recognized by the registry.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// Reading or writing an image failed.
    #[error("i/o error: {0}")]
    Io(String),
}
