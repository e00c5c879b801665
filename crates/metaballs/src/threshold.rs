//! Animated iso-threshold: the per-frame base value and the pointer bias.

use contour_art_core::config::MetaballConfig;
use glam::Vec2;
use noise::NoiseFn;

/// Base threshold for frame `frame`.
///
/// Walks 1-D noise along the time axis and maps its roughly [-1, 1] output
/// onto `[threshold_min, threshold_max]`. Stateless: the same frame always
/// yields the same value.
pub fn base_threshold<N>(config: &MetaballConfig, noise: &N, frame: u64) -> f64
where
    N: NoiseFn<f64, 3> + ?Sized,
{
    let n = noise.get([frame as f64 * config.threshold_speed, 0.0, 0.0]);
    config.threshold_center() + n * config.threshold_amplitude()
}

/// Pointer position and influence radius converted to grid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerGrid {
    pub x: f64,
    pub y: f64,
    /// Influence radius in cells, `ceil(pointer_radius / grid_resolution)`.
    pub radius: f64,
}

impl PointerGrid {
    /// Converts a viewport pointer position to the grid cell under it.
    pub fn from_viewport(pointer: Vec2, config: &MetaballConfig) -> Self {
        let res = config.grid_resolution;
        Self {
            x: (f64::from(pointer.x) / res).floor(),
            y: (f64::from(pointer.y) / res).floor(),
            radius: (config.pointer_radius / res).ceil(),
        }
    }

    /// Threshold bias at block `(x, y)`: `(1 - d/radius) * strength` inside
    /// the radius, 0 outside.
    pub fn influence(&self, x: usize, y: usize, strength: f64) -> f64 {
        let dx = x as f64 - self.x;
        let dy = y as f64 - self.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq >= self.radius * self.radius {
            return 0.0;
        }
        (1.0 - dist_sq.sqrt() / self.radius) * strength
    }
}
