//! Per-cell color storage for contour rendering.
//!
//! Colors are accumulated during field construction as mass-weighted sums in a
//! [`ColorAccumulator`] (struct-of-arrays, one `f64` lane per channel plus the
//! total weight). [`ColorAccumulator::finish`] consumes the accumulator and
//! yields a [`ColorField`] of 8-bit averages; the weight lane does not survive
//! that conversion.

use serde::Serialize;

use crate::error::EngineError;
use crate::field::GridSize;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unweighted mean of four colors, rounded to the nearest integer.
    pub fn average4(colors: [Rgb8; 4]) -> Rgb8 {
        let mean = |f: fn(&Rgb8) -> u8| {
            let sum: u16 = colors.iter().map(|c| u16::from(f(c))).sum();
            (f32::from(sum) / 4.0).round() as u8
        };
        Rgb8 {
            r: mean(|c| c.r),
            g: mean(|c| c.g),
            b: mean(|c| c.b),
        }
    }
}

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    let a = f32::from(a);
    let b = f32::from(b);
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Mass-weighted color sums gathered while a field is being built.
#[derive(Debug, Clone)]
pub struct ColorAccumulator {
    grid: GridSize,
    r: Vec<f64>,
    g: Vec<f64>,
    b: Vec<f64>,
    weight: Vec<f64>,
}

impl ColorAccumulator {
    /// Creates zeroed accumulators for every cell of `grid`.
    pub fn new(grid: GridSize) -> Self {
        let len = grid.len();
        Self {
            grid,
            r: vec![0.0; len],
            g: vec![0.0; len],
            b: vec![0.0; len],
            weight: vec![0.0; len],
        }
    }

    /// Adds `mass * rgb` to cell `idx` and `mass` to its weight.
    pub fn add(&mut self, idx: usize, rgb: [u8; 3], mass: f64) {
        self.r[idx] += f64::from(rgb[0]) * mass;
        self.g[idx] += f64::from(rgb[1]) * mass;
        self.b[idx] += f64::from(rgb[2]) * mass;
        self.weight[idx] += mass;
    }

    /// Converts the weighted sums into per-cell averages.
    ///
    /// Cells with zero weight stay black. Averages are rounded to the nearest
    /// integer and clamped to [0, 255].
    pub fn finish(self) -> ColorField {
        let len = self.grid.len();
        let mut out = ColorField::new(self.grid);
        for i in 0..len {
            let w = self.weight[i];
            if w > 0.0 {
                out.r[i] = average_channel(self.r[i], w);
                out.g[i] = average_channel(self.g[i], w);
                out.b[i] = average_channel(self.b[i], w);
            }
        }
        out
    }
}

fn average_channel(sum: f64, weight: f64) -> u8 {
    (sum / weight).round().clamp(0.0, 255.0) as u8
}

/// Per-cell average colors, same indexing as the [`ScalarField`](crate::ScalarField)
/// it was built alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorField {
    grid: GridSize,
    r: Vec<u8>,
    g: Vec<u8>,
    b: Vec<u8>,
}

impl ColorField {
    /// Creates an all-black color field.
    pub fn new(grid: GridSize) -> Self {
        let len = grid.len();
        Self {
            grid,
            r: vec![0; len],
            g: vec![0; len],
            b: vec![0; len],
        }
    }

    /// Builds a color field from one color per cell in row-major order.
    pub fn from_colors(grid: GridSize, colors: &[Rgb8]) -> Result<Self, EngineError> {
        if colors.len() != grid.len() {
            return Err(EngineError::DimensionMismatch {
                lhs_w: grid.width,
                lhs_h: grid.height,
                rhs_w: colors.len(),
                rhs_h: 1,
            });
        }
        Ok(Self {
            grid,
            r: colors.iter().map(|c| c.r).collect(),
            g: colors.iter().map(|c| c.g).collect(),
            b: colors.iter().map(|c| c.b).collect(),
        })
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Color of the cell at flat index `idx`.
    pub fn get(&self, idx: usize) -> Rgb8 {
        Rgb8::new(self.r[idx], self.g[idx], self.b[idx])
    }

    /// Color of the cell at `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> Rgb8 {
        self.get(self.grid.index(x, y))
    }

    /// Unweighted average of the four corners of the block whose top-left is `(x, y)`.
    pub fn block_average(&self, x: usize, y: usize) -> Rgb8 {
        Rgb8::average4([
            self.at(x, y),
            self.at(x + 1, y),
            self.at(x, y + 1),
            self.at(x + 1, y + 1),
        ])
    }

    /// Writes the channel-wise blend `self -> other` at `t` into `out`.
    pub fn lerp_into(
        &self,
        other: &ColorField,
        t: f32,
        out: &mut ColorField,
    ) -> Result<(), EngineError> {
        for g in [other.grid, out.grid] {
            if g != self.grid {
                return Err(EngineError::DimensionMismatch {
                    lhs_w: self.grid.width,
                    lhs_h: self.grid.height,
                    rhs_w: g.width,
                    rhs_h: g.height,
                });
            }
        }
        blend_lane(&self.r, &other.r, t, &mut out.r);
        blend_lane(&self.g, &other.g, t, &mut out.g);
        blend_lane(&self.b, &other.b, t, &mut out.b);
        Ok(())
    }

    /// Iterates over all cell colors in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Rgb8> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}

fn blend_lane(from: &[u8], to: &[u8], t: f32, out: &mut [u8]) {
    out.iter_mut()
        .zip(from.iter().zip(to.iter()))
        .for_each(|(o, (&a, &b))| *o = lerp_channel(a, b, t));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(w: usize, h: usize) -> GridSize {
        GridSize::new(w, h).unwrap()
    }

    // -- Rgb8 --

    #[test]
    fn serializes_as_channel_object() {
        let json = serde_json::to_value(Rgb8::new(255, 0, 128)).unwrap();
        assert_eq!(json, serde_json::json!({"r": 255, "g": 0, "b": 128}));
    }

    #[test]
    fn average4_rounds_mean() {
        let avg = Rgb8::average4([
            Rgb8::new(255, 0, 1),
            Rgb8::new(255, 0, 1),
            Rgb8::new(0, 0, 0),
            Rgb8::new(0, 2, 0),
        ]);
        assert_eq!(avg, Rgb8::new(128, 1, 1));
    }

    // -- ColorAccumulator --

    #[test]
    fn finish_produces_mass_weighted_average() {
        let mut acc = ColorAccumulator::new(grid(2, 1));
        acc.add(0, [200, 100, 0], 3.0);
        acc.add(0, [0, 100, 40], 1.0);
        let colors = acc.finish();
        assert_eq!(colors.get(0), Rgb8::new(150, 100, 10));
    }

    #[test]
    fn finish_leaves_zero_weight_cells_black() {
        let mut acc = ColorAccumulator::new(grid(2, 1));
        acc.add(1, [9, 9, 9], 0.5);
        let colors = acc.finish();
        assert_eq!(colors.get(0), Rgb8::BLACK);
        assert_eq!(colors.get(1), Rgb8::new(9, 9, 9));
    }

    // -- ColorField --

    #[test]
    fn block_average_uses_four_corners() {
        let colors = ColorField::from_colors(
            grid(2, 2),
            &[
                Rgb8::new(100, 0, 0),
                Rgb8::new(0, 100, 0),
                Rgb8::new(0, 0, 100),
                Rgb8::new(100, 100, 100),
            ],
        )
        .unwrap();
        assert_eq!(colors.block_average(0, 0), Rgb8::new(50, 50, 50));
    }

    #[test]
    fn from_colors_rejects_wrong_length() {
        assert!(ColorField::from_colors(grid(2, 2), &[Rgb8::BLACK]).is_err());
    }

    #[test]
    fn lerp_into_blends_every_channel() {
        let a = ColorField::from_colors(grid(1, 1), &[Rgb8::new(0, 100, 200)]).unwrap();
        let b = ColorField::from_colors(grid(1, 1), &[Rgb8::new(100, 100, 0)]).unwrap();
        let mut out = ColorField::new(grid(1, 1));
        a.lerp_into(&b, 0.5, &mut out).unwrap();
        assert_eq!(out.get(0), Rgb8::new(50, 100, 100));
    }

    #[test]
    fn lerp_into_endpoints_are_exact() {
        let a = ColorField::from_colors(grid(1, 1), &[Rgb8::new(10, 200, 33)]).unwrap();
        let b = ColorField::from_colors(grid(1, 1), &[Rgb8::new(250, 0, 34)]).unwrap();
        let mut out = ColorField::new(grid(1, 1));
        a.lerp_into(&b, 0.0, &mut out).unwrap();
        assert_eq!(out, a);
        a.lerp_into(&b, 1.0, &mut out).unwrap();
        assert_eq!(out, b);
    }

    #[test]
    fn lerp_into_rejects_dimension_mismatch() {
        let a = ColorField::new(grid(2, 2));
        let b = ColorField::new(grid(1, 4));
        let mut out = ColorField::new(grid(2, 2));
        assert!(matches!(
            a.lerp_into(&b, 0.5, &mut out),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn accumulated_average_stays_within_contributions(
                samples in prop::collection::vec((any::<[u8; 3]>(), 0.001_f64..10.0), 1..20),
            ) {
                let mut acc = ColorAccumulator::new(grid(1, 1));
                for (rgb, mass) in &samples {
                    acc.add(0, *rgb, *mass);
                }
                let c = acc.finish().get(0);
                let lo = samples.iter().map(|(rgb, _)| rgb[0]).min().unwrap();
                let hi = samples.iter().map(|(rgb, _)| rgb[0]).max().unwrap();
                prop_assert!(c.r >= lo && c.r <= hi, "red {} outside [{lo}, {hi}]", c.r);
            }
        }
    }
}
