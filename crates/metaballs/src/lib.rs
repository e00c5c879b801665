#![deny(unsafe_code)]
//! Image-metaball contour engine.
//!
//! Samples the brightness of a source image into a coarse scalar field, then
//! draws iso-contours of that field with marching squares at a threshold that
//! drifts under Perlin noise and bends around the pointer. Switching images
//! crossfades the two fields with an ease-in-out curve.
//!
//! The pipeline, leaf to root: [`FieldBuilder`] turns pixels into a
//! `(ScalarField, ColorField)` pair, [`TransitionController`] blends two such
//! pairs, and [`ContourRenderer`] extracts the frame's segments.
//! [`ImageMetaballs`] ties them together behind the `Engine` trait.

pub mod builder;
pub mod debounce;
pub mod marching;
pub mod system;
pub mod threshold;
pub mod transition;

pub use builder::FieldBuilder;
pub use debounce::{ResizeDebounce, RESIZE_QUIET_MS};
pub use marching::{cell_code, interpolate_edge, segment_count, ContourRenderer, EDGE_TABLE};
pub use system::{ImageMetaballs, DEFAULT_SEED};
pub use threshold::{base_threshold, PointerGrid};
pub use transition::{ease_in_out_cubic, FieldPair, TransitionController};
