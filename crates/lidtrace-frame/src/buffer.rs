//! Packed ARGB frame buffer.

use crate::FrameError;

/// Opaque black, used for pixels with no source coverage.
pub const OPAQUE_BLACK: u32 = 0xFF00_0000;

/// A row-major buffer of packed `0xAARRGGBB` pixels with no stride padding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl RgbBuffer {
    /// Allocate a buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![OPAQUE_BLACK; width as usize * height as usize],
        }
    }

    /// Wrap existing pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Resize to `width × height`, reallocating only when the dimensions change.
    ///
    /// Returns true if the buffer was reallocated. Pixel contents are
    /// unspecified after a reallocation and left untouched otherwise.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        tracing::debug!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "reallocating frame buffer"
        );
        self.width = width;
        self.height = height;
        self.pixels = vec![OPAQUE_BLACK; width as usize * height as usize];
        true
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel at (x, y), or `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Fill every pixel with a single color.
    pub fn fill(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }

    /// Copy into an `image` RGBA buffer (straight alpha).
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for &p in &self.pixels {
            let [a, r, g, b] = p.to_be_bytes();
            raw.extend_from_slice(&[r, g, b, a]);
        }
        // Length always matches width * height * 4.
        image::RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Build a buffer from an `image` RGBA buffer.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                u32::from_be_bytes([a, r, g, b])
            })
            .collect();
        Self {
            width: img.width(),
            height: img.height(),
            pixels,
        }
    }
}

/// Split a packed pixel into `(a, r, g, b)`.
pub fn unpack_argb(p: u32) -> (u8, u8, u8, u8) {
    let [a, r, g, b] = p.to_be_bytes();
    (a, r, g, b)
}

/// Pack `(a, r, g, b)` into `0xAARRGGBB`.
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_size_reuses_allocation() {
        let mut buf = RgbBuffer::new(4, 2);
        buf.fill(0xFF12_3456);
        assert!(!buf.ensure_size(4, 2));
        assert_eq!(buf.get(3, 1), Some(0xFF12_3456));

        assert!(buf.ensure_size(2, 2));
        assert_eq!(buf.pixels.len(), 4);
    }

    #[test]
    fn test_from_pixels_length_mismatch() {
        let result = RgbBuffer::from_pixels(2, 2, vec![0; 3]);
        assert_eq!(
            result,
            Err(FrameError::BufferSize {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_get_out_of_bounds() {
        let buf = RgbBuffer::new(2, 2);
        assert_eq!(buf.get(2, 0), None);
        assert_eq!(buf.get(0, 2), None);
        assert_eq!(buf.get(1, 1), Some(OPAQUE_BLACK));
    }

    #[test]
    fn test_rgba_image_interop() {
        let buf = RgbBuffer::from_pixels(2, 1, vec![0xFFFF_0000, 0x8000_FF00]).unwrap();
        let img = buf.to_rgba_image();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 128]);
        assert_eq!(RgbBuffer::from_rgba_image(&img), buf);
    }

    #[test]
    fn test_pack_unpack() {
        let p = pack_argb(0xFF, 0x12, 0x34, 0x56);
        assert_eq!(p, 0xFF12_3456);
        assert_eq!(unpack_argb(p), (0xFF, 0x12, 0x34, 0x56));
    }
}
