//! Per-frame contour output.

use glam::Vec2;
use serde::Serialize;

use crate::color::Rgb8;

/// One colored contour line, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
    pub color: Rgb8,
}

impl Segment {
    pub fn new(p1: Vec2, p2: Vec2, color: Rgb8) -> Self {
        Self { p1, p2, color }
    }
}

/// Everything needed to draw one frame: segments are stroked with
/// `line_width` and round caps over a cleared background.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub segments: Vec<Segment>,
    pub line_width: f32,
    /// Base threshold the frame was extracted at, before per-cell noise.
    pub threshold: f64,
    pub frame_index: u64,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
