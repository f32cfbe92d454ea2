//! Stroking closed eyelid curves onto a drawing surface.

use crate::lids::LidTable;
use crate::spline::CurveError;
use crate::types::Point;
use lidtrace_frame::buffer::{pack_argb, unpack_argb};
use lidtrace_frame::RgbBuffer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{ColorU8, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Minimal path primitives the renderer needs from a drawing target.
pub trait PathSurface {
    /// Start a new sub-path at `p`.
    fn move_to(&mut self, p: Point);
    /// Quadratic Bézier from the current point to `end` via `ctrl`.
    fn quad_to(&mut self, ctrl: Point, end: Point);
    /// Stroke (never fill) the accumulated path, then clear it.
    fn stroke(&mut self, style: &StrokeStyle);
}

/// Stroke color (`0xAARRGGBB`) and width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: u32,
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: 0xFF00_FF00,
            width: 2.0,
        }
    }
}

/// Draw `points` as one closed, stroked quadratic spline.
///
/// Starts at `points[0]`; each odd-indexed point is a control point whose
/// segment ends at the following point, wrapping back to `points[0]`.
pub fn draw_closed_spline<S: PathSurface + ?Sized>(
    surface: &mut S,
    points: &[Point],
    style: &StrokeStyle,
) -> Result<(), CurveError> {
    let n = points.len();
    if n == 0 || n % 2 != 0 {
        return Err(CurveError::InvalidCurveTopology { len: n });
    }

    surface.move_to(points[0]);
    for i in (1..n).step_by(2) {
        surface.quad_to(points[i], points[(i + 1) % n]);
    }
    surface.stroke(style);
    Ok(())
}

/// Renders both eyelid outlines for a face.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    table: LidTable,
    style: StrokeStyle,
}

impl OverlayRenderer {
    pub fn new(table: LidTable, style: StrokeStyle) -> Self {
        Self { table, style }
    }

    pub fn table(&self) -> &LidTable {
        &self.table
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Build the mirrored and direct curves for `landmarks` and stroke both.
    ///
    /// Nothing is drawn if either curve cannot be built.
    pub fn render_face<S: PathSurface + ?Sized>(
        &self,
        surface: &mut S,
        landmarks: &[Point],
    ) -> Result<(), CurveError> {
        let (mirrored, direct) = self.table.curves(landmarks)?;
        draw_closed_spline(surface, &mirrored, &self.style)?;
        draw_closed_spline(surface, &direct, &self.style)?;
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("cannot draw on an empty {width}x{height} buffer")]
    ZeroSized { width: u32, height: u32 },
}

/// Anti-aliased [`PathSurface`] over an [`RgbBuffer`], backed by tiny-skia.
///
/// The buffer is copied into a pixmap on creation. Strokes land in the
/// pixmap and are written back once, by [`PixmapSurface::finish`] or on drop.
pub struct PixmapSurface<'a> {
    target: &'a mut RgbBuffer,
    pixmap: Pixmap,
    path: PathBuilder,
    dirty: bool,
}

impl<'a> PixmapSurface<'a> {
    pub fn new(target: &'a mut RgbBuffer) -> Result<Self, CanvasError> {
        let mut pixmap = Pixmap::new(target.width, target.height).ok_or(CanvasError::ZeroSized {
            width: target.width,
            height: target.height,
        })?;

        for (dst, &src) in pixmap.pixels_mut().iter_mut().zip(&target.pixels) {
            let (a, r, g, b) = unpack_argb(src);
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Self {
            target,
            pixmap,
            path: PathBuilder::new(),
            dirty: false,
        })
    }

    /// Copy everything stroked so far into the target buffer.
    pub fn finish(mut self) {
        self.write_back();
    }

    fn write_back(&mut self) {
        if !self.dirty {
            return;
        }
        for (dst, src) in self.target.pixels.iter_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = pack_argb(c.alpha(), c.red(), c.green(), c.blue());
        }
        self.dirty = false;
        tracing::trace!(width = self.target.width, height = self.target.height, "overlay written back");
    }
}

impl Drop for PixmapSurface<'_> {
    fn drop(&mut self) {
        self.write_back();
    }
}

impl PathSurface for PixmapSurface<'_> {
    fn move_to(&mut self, p: Point) {
        self.path.move_to(p.x as f32, p.y as f32);
    }

    fn quad_to(&mut self, ctrl: Point, end: Point) {
        self.path
            .quad_to(ctrl.x as f32, ctrl.y as f32, end.x as f32, end.y as f32);
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        let builder = std::mem::replace(&mut self.path, PathBuilder::new());
        let Some(path) = builder.finish() else {
            tracing::trace!("empty path, nothing to stroke");
            return;
        };

        let (a, r, g, b) = unpack_argb(style.color);
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: style.width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        self.dirty = true;
    }
}
