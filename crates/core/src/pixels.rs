//! Pixel sources consumed by field construction.
//!
//! Field construction only needs read access to an RGBA raster placed
//! somewhere in viewport space. [`PixelSource`] is that contract;
//! [`PixelBuffer`] is the owned raster most callers produce, usually through
//! [`SourceImage::cover`], which lays a decoded image over the viewport the way
//! CSS `object-fit: cover` does.

use crate::error::EngineError;

/// Read access to an RGBA raster positioned in viewport coordinates.
pub trait PixelSource {
    /// Raster size in pixels, `(draw_width, draw_height)`.
    fn draw_size(&self) -> (usize, usize);

    /// Viewport position of the raster's top-left pixel. Negative when the
    /// raster overhangs the viewport.
    fn offset(&self) -> (f64, f64);

    /// RGBA bytes of the pixel at `(x, y)`, with `x < draw_width` and `y < draw_height`.
    fn rgba(&self, x: usize, y: usize) -> [u8; 4];

    /// True if there is nothing to sample.
    fn is_empty(&self) -> bool {
        let (w, h) = self.draw_size();
        w == 0 || h == 0
    }
}

/// Owned row-major RGBA8 raster with a viewport offset.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    offset_x: f64,
    offset_y: f64,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps `data` (4 bytes per pixel). A zero-area buffer is allowed and
    /// simply yields no samples.
    ///
    /// Returns `EngineError::DimensionMismatch` if `data.len() != width * height * 4`.
    pub fn new(
        width: usize,
        height: usize,
        offset: (f64, f64),
        data: Vec<u8>,
    ) -> Result<Self, EngineError> {
        check_rgba_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            offset_x: offset.0,
            offset_y: offset.1,
            data,
        })
    }

    /// A zero-area buffer.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            offset_x: 0.0,
            offset_y: 0.0,
            data: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl PixelSource for PixelBuffer {
    fn draw_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

fn check_rgba_len(width: usize, height: usize, len: usize) -> Result<(), EngineError> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(EngineError::InvalidDimensions)?;
    if len != expected {
        return Err(EngineError::DimensionMismatch {
            lhs_w: width,
            lhs_h: height,
            rhs_w: len / 4,
            rhs_h: 1,
        });
    }
    Ok(())
}

/// Placement of an image scaled to cover a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub draw_width: usize,
    pub draw_height: usize,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CoverFit {
    /// Scales `image` to fill `viewport` without distortion, centring the
    /// overflow on the cropped axis. Draw sizes are floored to whole pixels.
    ///
    /// A zero-area image or viewport yields a zero-area fit.
    pub fn compute(image: (usize, usize), viewport: (f64, f64)) -> Self {
        let (iw, ih) = image;
        let (vw, vh) = viewport;
        if iw == 0 || ih == 0 || !(vw > 0.0 && vh > 0.0) {
            return Self {
                draw_width: 0,
                draw_height: 0,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }

        let image_aspect = iw as f64 / ih as f64;
        let viewport_aspect = vw / vh;
        let (draw_w, draw_h, off_x, off_y) = if viewport_aspect > image_aspect {
            let draw_h = vw / image_aspect;
            (vw, draw_h, 0.0, (vh - draw_h) / 2.0)
        } else {
            let draw_w = vh * image_aspect;
            (draw_w, vh, (vw - draw_w) / 2.0, 0.0)
        };

        Self {
            draw_width: draw_w.floor() as usize,
            draw_height: draw_h.floor() as usize,
            offset_x: off_x,
            offset_y: off_y,
        }
    }
}

/// A decoded RGBA8 image at its natural size.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl SourceImage {
    /// Wraps decoded pixels. Zero-area images are accepted; they cover to an
    /// empty buffer and never produce a field.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, EngineError> {
        check_rgba_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A `width x height` image filled with one RGBA color.
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            data: rgba.repeat(width * height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resamples the image (nearest neighbour) to its cover-fit size for
    /// `viewport` and positions it at the cover-fit offset.
    pub fn cover(&self, viewport: (f64, f64)) -> PixelBuffer {
        let fit = CoverFit::compute((self.width, self.height), viewport);
        if fit.draw_width == 0 || fit.draw_height == 0 {
            return PixelBuffer::empty();
        }

        let mut data = Vec::with_capacity(fit.draw_width * fit.draw_height * 4);
        for y in 0..fit.draw_height {
            let sy = (y * self.height / fit.draw_height).min(self.height - 1);
            for x in 0..fit.draw_width {
                let sx = (x * self.width / fit.draw_width).min(self.width - 1);
                let i = (sy * self.width + sx) * 4;
                data.extend_from_slice(&self.data[i..i + 4]);
            }
        }

        PixelBuffer {
            width: fit.draw_width,
            height: fit.draw_height,
            offset_x: fit.offset_x,
            offset_y: fit.offset_y,
            data,
        }
    }
}
