//! Planar YUV420 frames and conversion to packed ARGB.

use crate::buffer::{RgbBuffer, OPAQUE_BLACK};
use crate::FrameError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Fixed-point BT.601 (video range) coefficients, 10 fractional bits.
const Y_SCALE: i32 = 1192;
const V_TO_R: i32 = 1634;
const V_TO_G: i32 = 833;
const U_TO_G: i32 = 400;
const U_TO_B: i32 = 2066;
const MAX_CHANNEL_VALUE: i32 = (1 << 18) - 1;

/// One color plane: borrowed sample bytes plus its layout.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows.
    pub row_stride: usize,
    /// Bytes between consecutive samples within a row.
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// Check that a `cols × rows` sample grid fits this plane.
    fn validate(&self, name: &'static str, cols: usize, rows: usize) -> Result<(), FrameError> {
        let invalid = |reason: String| FrameError::InvalidFrameGeometry {
            plane: name,
            reason,
        };

        if self.pixel_stride == 0 {
            return Err(invalid("pixel stride must be at least 1".into()));
        }

        let row_span = (cols - 1)
            .checked_mul(self.pixel_stride)
            .and_then(|s| s.checked_add(1))
            .ok_or_else(|| invalid("row span overflows".into()))?;
        if rows > 1 && self.row_stride < row_span {
            return Err(invalid(format!(
                "row stride {} is smaller than the row span {row_span}",
                self.row_stride
            )));
        }

        let required = (rows - 1)
            .checked_mul(self.row_stride)
            .and_then(|s| s.checked_add(row_span))
            .ok_or_else(|| invalid("plane extent overflows".into()))?;
        if self.data.len() < required {
            return Err(invalid(format!(
                "buffer holds {} bytes, {cols}x{rows} samples need {required}",
                self.data.len()
            )));
        }

        Ok(())
    }
}

/// Memory layouts for a contiguous raw YUV420 dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawLayout {
    /// Y plane, then U plane, then V plane (pixel stride 1).
    I420,
    /// Y plane, then interleaved U/V (pixel stride 2).
    Nv12,
    /// Y plane, then interleaved V/U (pixel stride 2, Android camera default).
    Nv21,
}

impl FromStr for RawLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i420" | "yuv420p" => Ok(Self::I420),
            "nv12" => Ok(Self::Nv12),
            "nv21" => Ok(Self::Nv21),
            other => Err(format!("unknown YUV420 layout: {other} (need i420, nv12 or nv21)")),
        }
    }
}

/// A planar YUV420 frame: full-resolution luma, chroma subsampled 2x2.
#[derive(Debug, Clone, Copy)]
pub struct Yuv420Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl<'a> Yuv420Frame<'a> {
    /// Build plane views over a contiguous raw buffer in the given layout.
    pub fn from_raw(
        data: &'a [u8],
        width: u32,
        height: u32,
        layout: RawLayout,
    ) -> Result<Self, FrameError> {
        let w = width as usize;
        let h = height as usize;
        let (cw, ch) = chroma_dims(w, h);
        let luma_len = w * h;
        let expected = luma_len + 2 * cw * ch;
        if data.len() < expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        let y = Plane::new(&data[..luma_len], w, 1);
        if expected == luma_len {
            let empty = Plane::new(&[], 0, 1);
            return Ok(Self {
                width,
                height,
                y,
                u: empty,
                v: empty,
            });
        }

        let chroma = &data[luma_len..expected];
        let (u, v) = match layout {
            RawLayout::I420 => {
                let (u, v) = chroma.split_at(cw * ch);
                (Plane::new(u, cw, 1), Plane::new(v, cw, 1))
            }
            RawLayout::Nv12 => (
                Plane::new(chroma, cw * 2, 2),
                Plane::new(&chroma[1..], cw * 2, 2),
            ),
            RawLayout::Nv21 => (
                Plane::new(&chroma[1..], cw * 2, 2),
                Plane::new(chroma, cw * 2, 2),
            ),
        };

        let frame = Self {
            width,
            height,
            y,
            u,
            v,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Validate every plane against the frame dimensions.
    pub fn validate(&self) -> Result<(), FrameError> {
        let w = self.width as usize;
        let h = self.height as usize;
        if w == 0 || h == 0 {
            return Ok(());
        }
        let (cw, ch) = chroma_dims(w, h);
        self.y.validate("Y", w, h)?;
        self.u.validate("U", cw, ch)?;
        self.v.validate("V", cw, ch)?;
        Ok(())
    }
}

/// Chroma grid size for a `w × h` luma grid.
fn chroma_dims(w: usize, h: usize) -> (usize, usize) {
    (w.div_ceil(2), h.div_ceil(2))
}

/// Convert one YUV sample triple to packed opaque ARGB.
#[inline]
pub fn yuv_to_argb(y: u8, u: u8, v: u8) -> u32 {
    let y = (y as i32 - 16).max(0) * Y_SCALE;
    let u = u as i32 - 128;
    let v = v as i32 - 128;

    let r = (y + V_TO_R * v).clamp(0, MAX_CHANNEL_VALUE);
    let g = (y - V_TO_G * v - U_TO_G * u).clamp(0, MAX_CHANNEL_VALUE);
    let b = (y + U_TO_B * u).clamp(0, MAX_CHANNEL_VALUE);

    OPAQUE_BLACK | (((r >> 10) as u32) << 16) | (((g >> 10) as u32) << 8) | (b >> 10) as u32
}

/// Convert a YUV420 frame into `out`, resizing it only if the dimensions changed.
///
/// Geometry is validated once up front; the per-pixel loop does no checks
/// beyond slice indexing.
pub fn convert_yuv420_to_argb(frame: &Yuv420Frame<'_>, out: &mut RgbBuffer) -> Result<(), FrameError> {
    frame.validate()?;
    out.ensure_size(frame.width, frame.height);
    if out.is_empty() {
        return Ok(());
    }

    let w = frame.width as usize;
    let Yuv420Frame { y, u, v, .. } = *frame;

    for (row, dst) in out.pixels.chunks_exact_mut(w).enumerate() {
        let y_row = row * y.row_stride;
        let u_row = (row >> 1) * u.row_stride;
        let v_row = (row >> 1) * v.row_stride;

        for (col, px) in dst.iter_mut().enumerate() {
            let luma = y.data[y_row + col * y.pixel_stride];
            let cb = u.data[u_row + (col >> 1) * u.pixel_stride];
            let cr = v.data[v_row + (col >> 1) * v.pixel_stride];
            *px = yuv_to_argb(luma, cb, cr);
        }
    }

    Ok(())
}

/// Stateful converter that reuses its output buffer across frames.
#[derive(Default)]
pub struct FrameConverter {
    rgb: RgbBuffer,
}

impl FrameConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a frame, returning a view of the internal ARGB buffer.
    pub fn convert(&mut self, frame: &Yuv420Frame<'_>) -> Result<&RgbBuffer, FrameError> {
        if self.rgb.width != frame.width || self.rgb.height != frame.height {
            tracing::info!(
                width = frame.width,
                height = frame.height,
                "initializing conversion buffer"
            );
        }
        convert_yuv420_to_argb(frame, &mut self.rgb)?;
        Ok(&self.rgb)
    }

    /// Most recently converted frame.
    pub fn buffer(&self) -> &RgbBuffer {
        &self.rgb
    }
}

/// Convert a frame into a freshly allocated buffer.
pub fn convert(frame: &Yuv420Frame<'_>) -> Result<RgbBuffer, FrameError> {
    let mut out = RgbBuffer::default();
    convert_yuv420_to_argb(frame, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_to_argb_reference_values() {
        assert_eq!(yuv_to_argb(16, 128, 128), 0xFF00_0000);
        assert_eq!(yuv_to_argb(235, 128, 128), 0xFFFE_FEFE);
        assert_eq!(yuv_to_argb(128, 128, 128), 0xFF82_8282);
        assert_eq!(yuv_to_argb(81, 90, 240), 0xFFFE_0000);
        assert_eq!(yuv_to_argb(145, 54, 34), 0xFF00_FF00);
        assert_eq!(yuv_to_argb(41, 240, 110), 0xFF00_00FF);
    }

    #[test]
    fn test_yuv_to_argb_clamps() {
        // Y below the video-range floor and extreme chroma on both ends.
        assert_eq!(yuv_to_argb(0, 0, 0), 0xFF00_9A00);
        assert_eq!(yuv_to_argb(255, 255, 255), 0xFFFF_7DFF);
    }

    #[test]
    fn test_uniform_frame_all_strides() {
        let expected = yuv_to_argb(200, 100, 150);
        let (w, h) = (6usize, 4usize);

        for (y_rs, uv_rs, uv_ps) in [(6, 3, 1), (8, 4, 1), (6, 6, 2), (10, 8, 2)] {
            let y_data = vec![200u8; y_rs * h];
            let u_data = vec![100u8; uv_rs * 2];
            let v_data = vec![150u8; uv_rs * 2];
            let frame = Yuv420Frame {
                width: w as u32,
                height: h as u32,
                y: Plane::new(&y_data, y_rs, 1),
                u: Plane::new(&u_data, uv_rs, uv_ps),
                v: Plane::new(&v_data, uv_rs, uv_ps),
            };
            let rgb = convert(&frame).unwrap();
            assert_eq!(rgb.pixels.len(), w * h);
            assert!(
                rgb.pixels.iter().all(|&p| p == expected),
                "strides ({y_rs}, {uv_rs}, {uv_ps}) produced a non-uniform buffer"
            );
        }
    }

    #[test]
    fn test_4x4_known_grid() {
        // Luma quadrants paired with chroma quadrants:
        //   TL red, TR green, BL blue, BR neutral with black/white/grey luma.
        #[rustfmt::skip]
        let y_data = [
            81, 81, 145, 145,
            81, 81, 145, 145,
            41, 41, 16, 235,
            41, 41, 128, 128,
        ];
        let u_data = [90, 54, 240, 128];
        let v_data = [240, 34, 110, 128];
        let frame = Yuv420Frame {
            width: 4,
            height: 4,
            y: Plane::new(&y_data, 4, 1),
            u: Plane::new(&u_data, 2, 1),
            v: Plane::new(&v_data, 2, 1),
        };

        let rgb = convert(&frame).unwrap();

        const R: u32 = 0xFFFE_0000;
        const G: u32 = 0xFF00_FF00;
        const B: u32 = 0xFF00_00FF;
        #[rustfmt::skip]
        let expected = vec![
            R, R, G, G,
            R, R, G, G,
            B, B, 0xFF00_0000, 0xFFFE_FEFE,
            B, B, 0xFF82_8282, 0xFF82_8282,
        ];
        assert_eq!(rgb.pixels, expected);
    }

    #[test]
    fn test_zero_size_is_empty() {
        let frame = Yuv420Frame {
            width: 0,
            height: 0,
            y: Plane::new(&[], 0, 1),
            u: Plane::new(&[], 0, 1),
            v: Plane::new(&[], 0, 1),
        };
        let rgb = convert(&frame).unwrap();
        assert!(rgb.is_empty());
    }

    #[test]
    fn test_short_plane_rejected() {
        let y_data = vec![16u8; 15]; // 4x4 needs 16
        let uv = vec![128u8; 4];
        let frame = Yuv420Frame {
            width: 4,
            height: 4,
            y: Plane::new(&y_data, 4, 1),
            u: Plane::new(&uv, 2, 1),
            v: Plane::new(&uv, 2, 1),
        };
        let err = convert(&frame).unwrap_err();
        assert!(matches!(err, FrameError::InvalidFrameGeometry { plane: "Y", .. }));
    }

    #[test]
    fn test_row_stride_too_small_rejected() {
        let y_data = vec![16u8; 64];
        let uv = vec![128u8; 64];
        let frame = Yuv420Frame {
            width: 4,
            height: 4,
            y: Plane::new(&y_data, 4, 1),
            // Two interleaved samples per row need a row span of 3 bytes.
            u: Plane::new(&uv, 2, 2),
            v: Plane::new(&uv, 4, 2),
        };
        let err = convert(&frame).unwrap_err();
        assert!(matches!(err, FrameError::InvalidFrameGeometry { plane: "U", .. }));
    }

    #[test]
    fn test_zero_pixel_stride_rejected() {
        let data = vec![0u8; 16];
        let frame = Yuv420Frame {
            width: 4,
            height: 4,
            y: Plane::new(&data, 4, 1),
            u: Plane::new(&data, 2, 1),
            v: Plane::new(&data, 2, 0),
        };
        assert!(matches!(
            frame.validate(),
            Err(FrameError::InvalidFrameGeometry { plane: "V", .. })
        ));
    }

    #[test]
    fn test_raw_layouts_agree() {
        // 4x2 picture: two chroma samples per plane.
        let luma = [20u8, 60, 100, 140, 180, 220, 235, 16];
        let u = [90u8, 200];
        let v = [240u8, 80];

        let mut i420 = luma.to_vec();
        i420.extend_from_slice(&u);
        i420.extend_from_slice(&v);

        let mut nv12 = luma.to_vec();
        nv12.extend_from_slice(&[u[0], v[0], u[1], v[1]]);

        let mut nv21 = luma.to_vec();
        nv21.extend_from_slice(&[v[0], u[0], v[1], u[1]]);

        let a = convert(&Yuv420Frame::from_raw(&i420, 4, 2, RawLayout::I420).unwrap()).unwrap();
        let b = convert(&Yuv420Frame::from_raw(&nv12, 4, 2, RawLayout::Nv12).unwrap()).unwrap();
        let c = convert(&Yuv420Frame::from_raw(&nv21, 4, 2, RawLayout::Nv21).unwrap()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.get(0, 0), Some(yuv_to_argb(20, 90, 240)));
        assert_eq!(a.get(3, 1), Some(yuv_to_argb(16, 200, 80)));
    }

    #[test]
    fn test_raw_odd_dimensions() {
        // 3x3 luma → 2x2 chroma.
        let data = vec![128u8; 9 + 8];
        let frame = Yuv420Frame::from_raw(&data, 3, 3, RawLayout::Nv21).unwrap();
        let rgb = convert(&frame).unwrap();
        assert_eq!(rgb.pixels.len(), 9);
        assert!(rgb.pixels.iter().all(|&p| p == 0xFF82_8282));
    }

    #[test]
    fn test_raw_too_short() {
        let data = vec![0u8; 10];
        let result = Yuv420Frame::from_raw(&data, 4, 2, RawLayout::I420);
        assert_eq!(
            result.unwrap_err(),
            FrameError::BufferSize {
                expected: 12,
                actual: 10
            }
        );
    }

    #[test]
    fn test_raw_layout_from_str() {
        assert_eq!("NV21".parse::<RawLayout>(), Ok(RawLayout::Nv21));
        assert_eq!("yuv420p".parse::<RawLayout>(), Ok(RawLayout::I420));
        assert!("rgb".parse::<RawLayout>().is_err());
    }

    #[test]
    fn test_converter_reuses_buffer() {
        let data = vec![128u8; 16 + 8];
        let frame = Yuv420Frame::from_raw(&data, 4, 4, RawLayout::I420).unwrap();
        let mut converter = FrameConverter::new();
        let ptr = converter.convert(&frame).unwrap().pixels.as_ptr();
        let again = converter.convert(&frame).unwrap().pixels.as_ptr();
        assert_eq!(ptr, again);
        assert_eq!(converter.buffer().get(2, 2), Some(0xFF82_8282));
    }
}
