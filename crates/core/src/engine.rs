//! The core `Engine` trait that every contour engine implements.
//!
//! The trait is object-safe so engines can be used as `dyn Engine` and picked
//! at runtime from the registry.

use crate::error::EngineError;
use crate::field::ScalarField;
use crate::segment::Frame;
use serde_json::Value;

/// Core trait for frame-driven contour engines.
///
/// Each call to [`Engine::step`] is one redraw: the engine advances its own
/// animation state to `now_ms` and returns the segments to draw.
///
/// This trait is **object-safe**: you can use `Box<dyn Engine>` or `&dyn Engine`
/// for runtime polymorphism.
pub trait Engine {
    /// Advance to the wall-clock time `now_ms` (milliseconds, monotonic) and
    /// produce the frame to draw.
    fn step(&mut self, now_ms: f64) -> Result<Frame, EngineError>;

    /// The scalar field the last frame was extracted from, or `None` while no
    /// field is available.
    fn field(&self) -> Option<&ScalarField>;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters, their types, ranges, and defaults.
    fn param_schema(&self) -> Value;
}
