//! Marching squares over a scalar field with a per-cell animated threshold.
//!
//! Each interior 2x2 block of grid corners is classified into a 4-bit code:
//! bit 0 is the top-left corner, bit 1 top-right, bit 2 bottom-right and
//! bit 3 bottom-left, each set when the corner exceeds the block's local
//! threshold. The code selects pairs of cell edges (0 top, 1 right,
//! 2 bottom, 3 left) from [`EDGE_TABLE`]; each pair becomes one segment
//! between the interpolated iso-crossings on those edges.

use contour_art_core::color::ColorField;
use contour_art_core::config::{MetaballConfig, SaddleResolution};
use contour_art_core::error::EngineError;
use contour_art_core::field::ScalarField;
use contour_art_core::segment::Segment;
use glam::Vec2;
use noise::NoiseFn;

use crate::threshold::PointerGrid;

/// Edge pairs to connect for each of the 16 cell codes.
///
/// Codes 5 and 10 are the checkerboard cases; their entries connect all four
/// edge crossings.
pub const EDGE_TABLE: [&[usize]; 16] = [
    &[],
    &[3, 0],
    &[0, 1],
    &[3, 1],
    &[1, 2],
    &[0, 1, 2, 3],
    &[0, 2],
    &[3, 2],
    &[2, 3],
    &[2, 0],
    &[0, 3, 1, 2],
    &[2, 1],
    &[1, 3],
    &[1, 0],
    &[0, 3],
    &[],
];

/// Corner values closer than this are treated as a flat edge.
const FLAT_EDGE_EPSILON: f32 = 0.001;

/// Block corners in code-bit order: top-left, top-right, bottom-right, bottom-left.
pub type Corners = [f32; 4];

/// Classifies a block's corners against `threshold`.
pub fn cell_code(corners: Corners, threshold: f64) -> usize {
    let mut code = 0;
    for (bit, &v) in corners.iter().enumerate() {
        if f64::from(v) > threshold {
            code |= 1 << bit;
        }
    }
    code
}

/// Number of segments emitted for `code` under the fixed table.
pub fn segment_count(code: usize) -> usize {
    EDGE_TABLE[code & 15].len() / 2
}

/// Iso-crossing on the edge from `p1` (value `v1`) to `p2` (value `v2`).
///
/// Falls back to the edge midpoint unless the two values differ by strictly
/// more than `0.001`, so a difference of exactly `0.001` is flat. Otherwise the
/// crossing parameter is clamped to [0, 1].
pub fn interpolate_edge(p1: Vec2, p2: Vec2, v1: f32, v2: f32, threshold: f64) -> Vec2 {
    let t = if (v2 - v1).abs() > FLAT_EDGE_EPSILON {
        ((threshold - f64::from(v1)) / f64::from(v2 - v1)).clamp(0.0, 1.0) as f32
    } else {
        0.5
    };
    p1 + (p2 - p1) * t
}

/// Edge pairs for `code`, resolving the two checkerboard codes per `mode`.
pub fn edges_for(
    code: usize,
    corners: Corners,
    threshold: f64,
    mode: SaddleResolution,
) -> &'static [usize] {
    let code = code & 15;
    match (mode, code) {
        (SaddleResolution::CenterAverage, 5 | 10) => {
            let center = corners.iter().map(|&v| f64::from(v)).sum::<f64>() / 4.0;
            let center_inside = center > threshold;
            // Connected inside corners cut off the two outside corners, and
            // vice versa.
            match (code, center_inside) {
                (5, true) | (10, false) => &[0, 1, 2, 3],
                _ => &[3, 0, 1, 2],
            }
        }
        _ => EDGE_TABLE[code],
    }
}

/// Stateless per-frame contour extraction.
///
/// Borrows the noise generator and the configuration snapshot for the frame;
/// nothing is kept between calls.
pub struct ContourRenderer<'a, N: ?Sized> {
    noise: &'a N,
    config: &'a MetaballConfig,
}

impl<'a, N> ContourRenderer<'a, N>
where
    N: NoiseFn<f64, 3> + ?Sized,
{
    pub fn new(noise: &'a N, config: &'a MetaballConfig) -> Self {
        Self { noise, config }
    }

    /// Threshold for block `(x, y)`: the frame's base value plus spatial and
    /// temporal noise, plus the pointer bias when a pointer is present.
    pub fn local_threshold(
        &self,
        x: usize,
        y: usize,
        base: f64,
        time: f64,
        pointer: Option<&PointerGrid>,
    ) -> f64 {
        let c = self.config;
        let n = self.noise.get([
            x as f64 * c.noise_scale,
            y as f64 * c.noise_scale,
            time * c.noise_speed,
        ]);
        let bias = pointer.map_or(0.0, |p| p.influence(x, y, c.pointer_strength));
        base + n * c.noise_strength + bias
    }

    /// Walks every interior block of `field` and returns the colored segments.
    ///
    /// Returns `EngineError::DimensionMismatch` if `colors` was built on a
    /// different grid.
    pub fn render(
        &self,
        field: &ScalarField,
        colors: &ColorField,
        base_threshold: f64,
        time: f64,
        pointer: Option<&PointerGrid>,
    ) -> Result<Vec<Segment>, EngineError> {
        let grid = field.grid();
        if colors.grid() != grid {
            return Err(EngineError::DimensionMismatch {
                lhs_w: grid.width,
                lhs_h: grid.height,
                rhs_w: colors.grid().width,
                rhs_h: colors.grid().height,
            });
        }

        let res = self.config.grid_resolution as f32;
        let mut segments = Vec::new();
        for y in 0..grid.height.saturating_sub(1) {
            for x in 0..grid.width.saturating_sub(1) {
                let corners = [
                    field.get(x, y),
                    field.get(x + 1, y),
                    field.get(x + 1, y + 1),
                    field.get(x, y + 1),
                ];
                let threshold = self.local_threshold(x, y, base_threshold, time, pointer);
                let code = cell_code(corners, threshold);
                let edges = edges_for(code, corners, threshold, self.config.saddle_resolution);
                if edges.is_empty() {
                    continue;
                }

                let crossings = edge_crossings(x, y, res, corners, threshold);
                let color = colors.block_average(x, y);
                segments.extend(
                    edges
                        .chunks_exact(2)
                        .map(|pair| Segment::new(crossings[pair[0]], crossings[pair[1]], color)),
                );
            }
        }
        Ok(segments)
    }
}

/// Crossing points on the top, right, bottom and left edges of block `(x, y)`.
fn edge_crossings(x: usize, y: usize, res: f32, corners: Corners, threshold: f64) -> [Vec2; 4] {
    let [v00, v10, v11, v01] = corners;
    let x0 = x as f32 * res;
    let y0 = y as f32 * res;
    let x1 = (x + 1) as f32 * res;
    let y1 = (y + 1) as f32 * res;
    let tl = Vec2::new(x0, y0);
    let tr = Vec2::new(x1, y0);
    let br = Vec2::new(x1, y1);
    let bl = Vec2::new(x0, y1);
    [
        interpolate_edge(tl, tr, v00, v10, threshold),
        interpolate_edge(tr, br, v10, v11, threshold),
        interpolate_edge(bl, br, v01, v11, threshold),
        interpolate_edge(tl, bl, v00, v01, threshold),
    ]
}
