//! Two-dimensional scalar "mass" field sampled on a coarse grid.
//!
//! A [`ScalarField`] stores `width * height` f32 values in row-major layout
//! (`index = y * width + x`). Fields are built by accumulation, normalized to
//! [0, 1] once, and afterwards only read, copied or blended.

use crate::error::EngineError;

/// Grid dimensions shared by a scalar field and its parallel color field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

impl GridSize {
    /// Creates a grid size, rejecting zero or overflowing dimensions.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self { width, height })
    }

    /// Derives the grid covering a viewport: `ceil(viewport / resolution)` per axis.
    ///
    /// `resolution` is the cell size in viewport units. A non-finite or
    /// non-positive result on either axis is `EngineError::InvalidDimensions`.
    pub fn from_viewport(
        viewport_width: f64,
        viewport_height: f64,
        resolution: f64,
    ) -> Result<Self, EngineError> {
        let w = (viewport_width / resolution).ceil();
        let h = (viewport_height / resolution).ceil();
        if !w.is_finite() || !h.is_finite() || w < 1.0 || h < 1.0 {
            return Err(EngineError::InvalidDimensions);
        }
        Self::new(w as usize, h as usize)
    }

    /// Number of cells, `width * height`.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false for a validated grid.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major flat index of `(x, y)`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// A dense grid of non-negative f32 values, normalized to [0, 1] after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    grid: GridSize,
    data: Vec<f32>,
}

impl ScalarField {
    /// Creates a zero-filled field for the given grid.
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            data: vec![0.0; grid.len()],
        }
    }

    /// Creates a field from a pre-built row-major vector.
    ///
    /// Returns `EngineError::DimensionMismatch` if `data.len() != width * height`.
    /// Values are taken as-is.
    pub fn from_data(grid: GridSize, data: Vec<f32>) -> Result<Self, EngineError> {
        if data.len() != grid.len() {
            return Err(EngineError::DimensionMismatch {
                lhs_w: grid.width,
                lhs_h: grid.height,
                rhs_w: data.len(),
                rhs_h: 1,
            });
        }
        Ok(Self { grid, data })
    }

    /// Field width in cells.
    pub fn width(&self) -> usize {
        self.grid.width
    }

    /// Field height in cells.
    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Read-only access to the underlying row-major data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access used by accumulation passes.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.grid.index(x, y)]
    }

    /// Largest value in the field (0 for an all-zero field).
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0_f32, f32::max)
    }

    /// Divides every value by the global maximum and returns that maximum.
    ///
    /// A field whose maximum is 0 is left untouched, so it stays exactly zero.
    pub fn normalize(&mut self) -> f32 {
        let max = self.max();
        if max > 0.0 {
            self.data.iter_mut().for_each(|v| *v /= max);
        }
        max
    }

    /// Writes `self + (other - self) * t` into `out` without touching either input.
    ///
    /// Returns `EngineError::DimensionMismatch` if any of the three grids differ.
    pub fn lerp_into(
        &self,
        other: &ScalarField,
        t: f32,
        out: &mut ScalarField,
    ) -> Result<(), EngineError> {
        self.check_same_grid(other)?;
        self.check_same_grid(out)?;
        out.data
            .iter_mut()
            .zip(self.data.iter().zip(other.data.iter()))
            .for_each(|(o, (a, b))| *o = a + (b - a) * t);
        Ok(())
    }

    /// Iterates over all cells yielding `(x, y, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let w = self.grid.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % w, i / w, v))
    }

    fn check_same_grid(&self, other: &ScalarField) -> Result<(), EngineError> {
        if self.grid != other.grid {
            return Err(EngineError::DimensionMismatch {
                lhs_w: self.grid.width,
                lhs_h: self.grid.height,
                rhs_w: other.grid.width,
                rhs_h: other.grid.height,
            });
        }
        Ok(())
    }
}
