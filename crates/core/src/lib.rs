#![deny(unsafe_code)]
//! Core types and traits for the contour-art system.
//!
//! Provides the `Engine` trait, the `ScalarField`/`ColorField` grids, `Rgb8`,
//! the seeded `PermutationNoise` generator and its `Xorshift64` PRNG, pixel
//! sources, `MetaballConfig`, `Segment`/`Frame` output and parameter helpers.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod params;
pub mod perlin;
pub mod pixels;
pub mod prng;
pub mod segment;

pub use color::{ColorAccumulator, ColorField, Rgb8};
pub use config::{FieldParams, MetaballConfig, SaddleResolution};
pub use engine::Engine;
pub use error::EngineError;
pub use field::{GridSize, ScalarField};
pub use perlin::PermutationNoise;
pub use pixels::{CoverFit, PixelBuffer, PixelSource, SourceImage};
pub use prng::Xorshift64;
pub use segment::{Frame, Segment};
