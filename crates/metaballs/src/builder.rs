//! Pixel source to scalar field conversion.
//!
//! Every sampled opaque pixel spreads its brightness over the grid cells whose
//! centers lie within `influence_radius`, weighted by the `(1 - d/r)^p`
//! falloff kernel. The same mass weights the pixel's color into the cell's
//! color average. The field is normalized to its own maximum afterwards, so
//! two images are comparable only in relative structure.

use contour_art_core::color::{ColorAccumulator, ColorField};
use contour_art_core::config::FieldParams;
use contour_art_core::error::EngineError;
use contour_art_core::field::{GridSize, ScalarField};
use contour_art_core::pixels::PixelSource;

/// Pixels with alpha below this contribute nothing.
const MIN_ALPHA: u8 = 128;

/// Builds `(ScalarField, ColorField)` pairs from pixel sources.
#[derive(Debug, Clone, Copy)]
pub struct FieldBuilder {
    params: FieldParams,
}

impl FieldBuilder {
    pub fn new(params: FieldParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> FieldParams {
        self.params
    }

    /// Accumulates and normalizes the field for `pixels` on `grid`.
    ///
    /// Returns `EngineError::EmptyPixelSource` when the source has no
    /// drawable area; nothing should be rendered from it.
    #[tracing::instrument(skip(self, pixels))]
    pub fn build(
        &self,
        pixels: &impl PixelSource,
        grid: GridSize,
    ) -> Result<(ScalarField, ColorField), EngineError> {
        if pixels.is_empty() {
            tracing::warn!("pixel source has no drawable area; no field built");
            return Err(EngineError::EmptyPixelSource);
        }

        let mut field = ScalarField::new(grid);
        let mut colors = ColorAccumulator::new(grid);

        let (draw_w, draw_h) = pixels.draw_size();
        let (offset_x, offset_y) = pixels.offset();
        let spacing = self.params.sample_spacing();

        let mut samples = 0usize;
        let mut y = 0.0_f64;
        while y < draw_h as f64 {
            let mut x = 0.0_f64;
            while x < draw_w as f64 {
                let rgba = pixels.rgba(x as usize, y as usize);
                if rgba[3] >= MIN_ALPHA {
                    self.deposit(&mut field, &mut colors, (x + offset_x, y + offset_y), rgba);
                    samples += 1;
                }
                x += spacing;
            }
            y += spacing;
        }

        let max = field.normalize();
        tracing::debug!(samples, max, "field accumulated");
        Ok((field, colors.finish()))
    }

    /// Spreads one pixel at viewport position `pos` over the cells in reach.
    fn deposit(
        &self,
        field: &mut ScalarField,
        colors: &mut ColorAccumulator,
        pos: (f64, f64),
        [r, g, b, _]: [u8; 4],
    ) {
        let grid = field.grid();
        let res = self.params.grid_resolution;
        let radius = self.params.influence_radius;
        let reach = self.params.influence_cells();
        let brightness = (f64::from(r) + f64::from(g) + f64::from(b)) / (3.0 * 255.0);

        let (px, py) = pos;
        let cell_x = (px / res).floor() as isize;
        let cell_y = (py / res).floor() as isize;
        let x_range = clamp_span(cell_x, reach, grid.width);
        let y_range = clamp_span(cell_y, reach, grid.height);

        for ty in y_range {
            let cy = ty as f64 * res + res / 2.0;
            for tx in x_range.clone() {
                let cx = tx as f64 * res + res / 2.0;
                let dist_sq = (px - cx).powi(2) + (py - cy).powi(2);
                if dist_sq >= radius * radius {
                    continue;
                }
                let falloff = (1.0 - dist_sq.sqrt() / radius).powf(self.params.falloff_power);
                let mass = brightness * falloff;
                let idx = grid.index(tx, ty);
                field.data_mut()[idx] += mass as f32;
                colors.add(idx, [r, g, b], mass);
            }
        }
    }
}

/// Cells `center - reach ..= center + reach`, clipped to `0..len`.
fn clamp_span(center: isize, reach: isize, len: usize) -> std::ops::Range<usize> {
    let lo = (center - reach).max(0);
    let hi = (center + reach + 1).min(len as isize);
    if hi <= lo {
        return 0..0;
    }
    lo as usize..hi as usize
}
