//! lidtrace-frame — Frame buffers and pixel plumbing.
//!
//! Converts planar YUV420 camera frames (arbitrary row/pixel strides) into
//! packed ARGB buffers and maps them onto a fixed square working resolution.

pub mod buffer;
pub mod transform;
pub mod yuv;

pub use buffer::RgbBuffer;
pub use transform::{CropTransform, FrameTransformer, Rotation};
pub use yuv::{FrameConverter, Plane, RawLayout, Yuv420Frame};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid frame geometry ({plane} plane): {reason}")]
    InvalidFrameGeometry { plane: &'static str, reason: String },
    #[error("unsupported output shape {width}x{height}: destination must be a non-empty square")]
    UnsupportedOutputShape { width: u32, height: u32 },
    #[error("unsupported rotation: {0} degrees (need -90, 0 or 90)")]
    UnsupportedRotation(i32),
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}
