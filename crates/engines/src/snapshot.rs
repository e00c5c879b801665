//! PNG snapshots of frames and decoding of source images.
//!
//! This module is feature-gated behind `png` (default on) so that consumers
//! which only need the registry do not pull in the `image` crate. The
//! rasterisation itself lives in [`crate::pixel`].

use contour_art_core::error::EngineError;
use contour_art_core::pixels::SourceImage;
use contour_art_core::segment::Frame;
use std::path::Path;

use crate::pixel::frame_to_rgba;

/// Rasterises `frame` at `width x height` and writes it as a PNG image.
///
/// Returns `EngineError::InvalidDimensions` if a side exceeds `u16::MAX`, or
/// `EngineError::Io` on write failure.
pub fn write_png(frame: &Frame, width: usize, height: usize, path: &Path) -> Result<(), EngineError> {
    let rgba = frame_to_rgba(frame, width, height)?;
    let w = u32::try_from(width).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}

/// Decodes a PNG or JPEG file into a [`SourceImage`].
///
/// Returns `EngineError::Io` if the file cannot be read or decoded.
pub fn load_source(path: &Path) -> Result<SourceImage, EngineError> {
    let img = image::open(path)
        .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    SourceImage::new(w as usize, h as usize, img.into_raw())
}
