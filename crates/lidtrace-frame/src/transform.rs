//! Center-crop, scale and rotate a frame onto a square working buffer.
//!
//! The geometric mapping is exact: the largest centered square of the
//! source is scaled to the destination edge length, then optionally rotated
//! by ±90° about the destination center. Sampling is nearest-neighbour at
//! destination pixel centers.

use crate::buffer::{RgbBuffer, OPAQUE_BLACK};
use crate::FrameError;
use serde::{Deserialize, Serialize};

/// Display-dependent rotation applied after cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// -90°: counter-clockwise on screen.
    Ccw90,
    #[default]
    None,
    /// 90°: clockwise on screen.
    Cw90,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Ccw90 => -90,
            Rotation::None => 0,
            Rotation::Cw90 => 90,
        }
    }

    /// Orientation rule for a display of the given size: portrait screens
    /// rotate the working buffer by -90°, landscape screens do not rotate.
    pub fn for_display(width: u32, height: u32) -> Self {
        if width < height {
            Rotation::Ccw90
        } else {
            Rotation::None
        }
    }

    /// Exact (sin, cos) for y-down image coordinates.
    fn sin_cos(self) -> (f32, f32) {
        match self {
            Rotation::Ccw90 => (-1.0, 0.0),
            Rotation::None => (0.0, 1.0),
            Rotation::Cw90 => (1.0, 0.0),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = FrameError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            -90 | 270 => Ok(Rotation::Ccw90),
            0 => Ok(Rotation::None),
            90 | -270 => Ok(Rotation::Cw90),
            other => Err(FrameError::UnsupportedRotation(other)),
        }
    }
}

/// A 2×3 affine map from source to destination pixel coordinates.
///
/// Stored as `[a, b, tx, c, d, ty]`:
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropTransform {
    matrix: [f32; 6],
    inverse: [f32; 6],
}

impl CropTransform {
    /// Build the crop/scale/rotate map for a `src_width × src_height` source
    /// drawn onto a `dst_size × dst_size` destination.
    pub fn new(src_width: u32, src_height: u32, dst_size: u32, rotation: Rotation) -> Self {
        let src_w = src_width as f32;
        let src_h = src_height as f32;
        let min_dim = src_w.min(src_h);

        // Only the center square of the source is kept.
        let crop_x = -((src_w - min_dim) / 2.0).max(0.0);
        let crop_y = -((src_h - min_dim) / 2.0).max(0.0);
        let scale = dst_size as f32 / min_dim;

        // Scaled crop, then rotation about the destination center.
        let center = dst_size as f32 / 2.0;
        let (sin, cos) = rotation.sin_cos();
        let px = scale * crop_x - center;
        let py = scale * crop_y - center;

        let matrix = [
            cos * scale,
            -sin * scale,
            cos * px - sin * py + center,
            sin * scale,
            cos * scale,
            sin * px + cos * py + center,
        ];

        Self {
            matrix,
            inverse: invert(&matrix),
        }
    }

    /// Map a source point into destination coordinates.
    pub fn forward(&self, x: f32, y: f32) -> (f32, f32) {
        apply(&self.matrix, x, y)
    }

    /// Map a destination point back to its source pre-image.
    pub fn inverse(&self, x: f32, y: f32) -> (f32, f32) {
        apply(&self.inverse, x, y)
    }

    pub fn matrix(&self) -> [f32; 6] {
        self.matrix
    }
}

fn apply(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
}

/// Invert a 2×3 affine map. A singular map inverts to all zeros.
fn invert(m: &[f32; 6]) -> [f32; 6] {
    let [a, b, tx, c, d, ty] = *m;
    let det = a * d - b * c;
    if det.abs() < 1e-12 {
        return [0.0; 6];
    }
    let inv_det = 1.0 / det;
    let ia = d * inv_det;
    let ib = -b * inv_det;
    let ic = -c * inv_det;
    let id = a * inv_det;
    [
        ia,
        ib,
        -(ia * tx + ib * ty),
        ic,
        id,
        -(ic * tx + id * ty),
    ]
}

/// Maps arbitrary-aspect frames onto a fixed square working buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransformer {
    size: u32,
}

impl FrameTransformer {
    /// Create a transformer for a `dst_width × dst_height` destination.
    ///
    /// The destination must be a non-empty square; this is a startup check.
    pub fn new(dst_width: u32, dst_height: u32) -> Result<Self, FrameError> {
        if dst_width != dst_height || dst_width == 0 {
            return Err(FrameError::UnsupportedOutputShape {
                width: dst_width,
                height: dst_height,
            });
        }
        Ok(Self { size: dst_width })
    }

    /// Edge length of the square destination.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Crop/rotate `src` into `dst`, resizing `dst` only if needed.
    pub fn transform_into(&self, src: &RgbBuffer, rotation: Rotation, dst: &mut RgbBuffer) {
        dst.ensure_size(self.size, self.size);
        if src.is_empty() {
            dst.fill(OPAQUE_BLACK);
            return;
        }

        let map = CropTransform::new(src.width, src.height, self.size, rotation);
        let src_w = src.width as usize;
        let size = self.size as usize;

        for (oy, row) in dst.pixels.chunks_exact_mut(size).enumerate() {
            for (ox, px) in row.iter_mut().enumerate() {
                let (sx, sy) = map.inverse(ox as f32 + 0.5, oy as f32 + 0.5);
                let (sx, sy) = (sx.floor(), sy.floor());
                *px = if sx >= 0.0 && sy >= 0.0 && sx < src.width as f32 && sy < src.height as f32 {
                    src.pixels[sy as usize * src_w + sx as usize]
                } else {
                    OPAQUE_BLACK
                };
            }
        }
    }

    /// Allocating variant of [`transform_into`](Self::transform_into).
    pub fn transform(&self, src: &RgbBuffer, rotation: Rotation) -> RgbBuffer {
        let mut dst = RgbBuffer::new(self.size, self.size);
        self.transform_into(src, rotation, &mut dst);
        dst
    }
}

/// One-shot crop/rotate into a new `dst_width × dst_height` buffer.
pub fn transform(
    src: &RgbBuffer,
    dst_width: u32,
    dst_height: u32,
    rotation: Rotation,
) -> Result<RgbBuffer, FrameError> {
    Ok(FrameTransformer::new(dst_width, dst_height)?.transform(src, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
            "expected {expected:?}, got {actual:?}"
        );
    }

    /// Buffer whose pixel value encodes its own coordinates.
    fn coordinate_buffer(width: u32, height: u32) -> RgbBuffer {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| 0xFF00_0000 | (x << 8) | y))
            .collect();
        RgbBuffer::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn test_no_rotation_corner_preimages_landscape() {
        // 640x480 source: center square starts at x = 80.
        let t = CropTransform::new(640, 480, 600, Rotation::None);
        assert_near(t.inverse(0.0, 0.0), (80.0, 0.0));
        assert_near(t.inverse(600.0, 0.0), (560.0, 0.0));
        assert_near(t.inverse(0.0, 600.0), (80.0, 480.0));
        assert_near(t.inverse(600.0, 600.0), (560.0, 480.0));

        // Pure scale + translation, no rotation component.
        let m = t.matrix();
        assert_eq!(m[1], 0.0);
        assert_eq!(m[3], 0.0);
        assert!((m[0] - 1.25).abs() < 1e-6);
        assert!((m[4] - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_no_rotation_corner_preimages_portrait() {
        let t = CropTransform::new(480, 640, 240, Rotation::None);
        assert_near(t.inverse(0.0, 0.0), (0.0, 80.0));
        assert_near(t.inverse(240.0, 240.0), (480.0, 560.0));
    }

    #[test]
    fn test_rotation_maps_crop_corners() {
        let cw = CropTransform::new(640, 480, 600, Rotation::Cw90);
        // Clockwise: crop top-left lands at destination top-right.
        assert_near(cw.forward(80.0, 0.0), (600.0, 0.0));
        assert_near(cw.forward(80.0, 480.0), (0.0, 0.0));
        assert_near(cw.forward(560.0, 480.0), (0.0, 600.0));

        let ccw = CropTransform::new(640, 480, 600, Rotation::Ccw90);
        // Counter-clockwise: crop top-left lands at destination bottom-left.
        assert_near(ccw.forward(80.0, 0.0), (0.0, 600.0));
        assert_near(ccw.forward(560.0, 0.0), (0.0, 0.0));

        // Rotation is about the destination center.
        assert_near(cw.forward(320.0, 240.0), (300.0, 300.0));
        assert_near(ccw.inverse(300.0, 300.0), (320.0, 240.0));
    }

    #[test]
    fn test_forward_inverse_roundtrip() {
        let t = CropTransform::new(1280, 720, 600, Rotation::Ccw90);
        let (dx, dy) = t.forward(700.0, 100.0);
        assert_near(t.inverse(dx, dy), (700.0, 100.0));
    }

    #[test]
    fn test_transform_crops_center() {
        let src = coordinate_buffer(4, 2);
        let dst = transform(&src, 2, 2, Rotation::None).unwrap();
        assert_eq!(
            dst.pixels,
            vec![
                src.get(1, 0).unwrap(),
                src.get(2, 0).unwrap(),
                src.get(1, 1).unwrap(),
                src.get(2, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_transform_rotates_clockwise() {
        let src = coordinate_buffer(4, 2);
        let dst = transform(&src, 2, 2, Rotation::Cw90).unwrap();
        assert_eq!(
            dst.pixels,
            vec![
                src.get(1, 1).unwrap(),
                src.get(1, 0).unwrap(),
                src.get(2, 1).unwrap(),
                src.get(2, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_transform_upscales_nearest() {
        let src = coordinate_buffer(2, 2);
        let dst = transform(&src, 4, 4, Rotation::None).unwrap();
        assert_eq!(dst.get(0, 0), src.get(0, 0));
        assert_eq!(dst.get(1, 1), src.get(0, 0));
        assert_eq!(dst.get(2, 1), src.get(1, 0));
        assert_eq!(dst.get(3, 3), src.get(1, 1));
    }

    #[test]
    fn test_non_square_output_rejected() {
        let err = FrameTransformer::new(600, 400).unwrap_err();
        assert_eq!(
            err,
            FrameError::UnsupportedOutputShape {
                width: 600,
                height: 400
            }
        );
        assert!(FrameTransformer::new(0, 0).is_err());
    }

    #[test]
    fn test_empty_source_fills_black() {
        let t = FrameTransformer::new(3, 3).unwrap();
        let dst = t.transform(&RgbBuffer::default(), Rotation::None);
        assert_eq!(dst.pixels, vec![OPAQUE_BLACK; 9]);
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::try_from(-90), Ok(Rotation::Ccw90));
        assert_eq!(Rotation::try_from(0), Ok(Rotation::None));
        assert_eq!(Rotation::try_from(90), Ok(Rotation::Cw90));
        assert_eq!(Rotation::try_from(45), Err(FrameError::UnsupportedRotation(45)));
        assert_eq!(Rotation::Ccw90.degrees(), -90);
    }

    #[test]
    fn test_rotation_for_display() {
        assert_eq!(Rotation::for_display(1080, 1920), Rotation::Ccw90);
        assert_eq!(Rotation::for_display(1920, 1080), Rotation::None);
        assert_eq!(Rotation::for_display(800, 800), Rotation::None);
    }
}
