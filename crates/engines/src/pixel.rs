//! CPU rasterisation of a [`Frame`] into an RGBA8 buffer.
//!
//! Segments are stroked in order over an opaque black background with round
//! caps, using `vello_cpu`'s anti-aliased path rasteriser.

use contour_art_core::error::EngineError;
use contour_art_core::segment::{Frame, Segment};
use vello_cpu::kurbo::{BezPath, Cap, Point, Rect, Stroke};
use vello_cpu::peniko::Color;

/// Rasterises `frame` into a `width x height` RGBA8 buffer (alpha always 255).
///
/// The buffer length is `width * height * 4`. Returns
/// `EngineError::InvalidDimensions` if either side exceeds `u16::MAX`.
pub fn frame_to_rgba(frame: &Frame, width: usize, height: usize) -> Result<Vec<u8>, EngineError> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }
    let w = u16::try_from(width).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u16::try_from(height).map_err(|_| EngineError::InvalidDimensions)?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(Color::from_rgba8(0, 0, 0, 255));
    ctx.fill_rect(&Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));

    ctx.set_stroke(Stroke::new(f64::from(frame.line_width.max(0.0))).with_caps(Cap::Round));
    for segment in &frame.segments {
        let c = segment.color;
        ctx.set_paint(Color::from_rgba8(c.r, c.g, c.b, 255));
        ctx.stroke_path(&segment_path(segment));
    }
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    // The black backdrop keeps every pixel opaque, so premultiplied equals straight.
    Ok(pixmap.data_as_u8_slice().to_vec())
}

fn segment_path(segment: &Segment) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(Point::new(f64::from(segment.p1.x), f64::from(segment.p1.y)));
    path.line_to(Point::new(f64::from(segment.p2.x), f64::from(segment.p2.y)));
    path
}
