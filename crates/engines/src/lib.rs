#![deny(unsafe_code)]
//! Engine registry: maps engine names to implementations and provides CPU-side
//! frame rasterisation and snapshots.
//!
//! This crate sits between `contour-art-core` (which defines the `Engine`
//! trait) and the engine crates (`contour-art-metaballs`). The CLI depends on
//! it so name-based dispatch lives in one place.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use contour_art_core::error::EngineError;
use contour_art_core::field::ScalarField;
use contour_art_core::pixels::SourceImage;
use contour_art_core::segment::Frame;
use contour_art_core::Engine;
use contour_art_metaballs::ImageMetaballs;
use glam::Vec2;
use serde_json::Value;

/// All available engine names.
const ENGINE_NAMES: &[&str] = &["image-metaballs"];

/// Enumeration of all available contour engines.
///
/// Wraps each engine implementation and delegates `Engine` trait methods.
/// Use [`EngineKind::from_name`] for string-based construction.
#[derive(Debug)]
pub enum EngineKind {
    /// Image brightness as animated marching-squares contours.
    ImageMetaballs(ImageMetaballs),
}

impl EngineKind {
    /// Constructs an engine by name for a `width x height` viewport.
    ///
    /// Returns `EngineError::UnknownEngine` if the name is not recognized.
    pub fn from_name(
        name: &str,
        sources: Vec<SourceImage>,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        match name {
            "image-metaballs" => Ok(EngineKind::ImageMetaballs(ImageMetaballs::from_json(
                sources,
                (width as f64, height as f64),
                seed,
                params,
            )?)),
            _ => Err(EngineError::UnknownEngine(name.to_string())),
        }
    }

    /// Returns a slice of all recognized engine names.
    pub fn list_engines() -> &'static [&'static str] {
        ENGINE_NAMES
    }

    /// Parameter schema of the named engine without constructing it.
    pub fn schema_for(name: &str) -> Result<Value, EngineError> {
        match name {
            "image-metaballs" => Ok(contour_art_core::MetaballConfig::param_schema()),
            _ => Err(EngineError::UnknownEngine(name.to_string())),
        }
    }

    /// Moves on to the next source image at `now_ms`.
    pub fn next_image(&mut self, now_ms: f64) -> Result<(), EngineError> {
        match self {
            EngineKind::ImageMetaballs(e) => e.next_image(now_ms),
        }
    }

    /// Sets or clears the pointer, in viewport pixels.
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        match self {
            EngineKind::ImageMetaballs(e) => e.set_pointer(pointer),
        }
    }

    /// Viewport size the engine draws into, in whole pixels.
    pub fn viewport(&self) -> (usize, usize) {
        match self {
            EngineKind::ImageMetaballs(e) => {
                let (w, h) = e.viewport();
                (w.ceil() as usize, h.ceil() as usize)
            }
        }
    }
}

impl Engine for EngineKind {
    fn step(&mut self, now_ms: f64) -> Result<Frame, EngineError> {
        match self {
            EngineKind::ImageMetaballs(e) => e.step(now_ms),
        }
    }

    fn field(&self) -> Option<&ScalarField> {
        match self {
            EngineKind::ImageMetaballs(e) => e.field(),
        }
    }

    fn params(&self) -> Value {
        match self {
            EngineKind::ImageMetaballs(e) => e.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            EngineKind::ImageMetaballs(e) => e.param_schema(),
        }
    }
}
