//! Control points interpolated between landmark pairs.
//!
//! A control point is not a landmark itself but a blend between two of
//! them, so a short table of specs can trace an eyelid outline and be
//! reused for the other eye through the symmetry table.

use crate::symmetry::SymmetryTable;
use crate::types::{ClosedCurve, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("landmark {0} has no mirror entry in the symmetry table")]
    UnmappedLandmarkIndex(usize),
    #[error("landmark index {index} out of range for a set of {len} points")]
    LandmarkIndexOutOfRange { index: usize, len: usize },
    #[error("closed spline needs a non-empty, even number of points, got {len}")]
    InvalidCurveTopology { len: usize },
    #[error("control point {position}: factor {factor} outside [0, 1]")]
    InvalidFactor { position: usize, factor: f32 },
    #[error("landmark {0} does not mirror back onto itself")]
    NonInvolutiveMirror(usize),
}

/// A point on the segment `landmarks[start] → landmarks[end]`, weighted
/// `factor` toward `start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPointSpec {
    pub start: usize,
    pub end: usize,
    pub factor: f32,
}

impl ControlPointSpec {
    pub const fn new(start: usize, end: usize, factor: f32) -> Self {
        Self { start, end, factor }
    }

    /// Check indices against a landmark set of `len` points and the factor
    /// against `[0, 1]`. `position` is only used for error reporting.
    pub fn validate(&self, position: usize, len: usize) -> Result<(), CurveError> {
        for index in [self.start, self.end] {
            if index >= len {
                return Err(CurveError::LandmarkIndexOutOfRange { index, len });
            }
        }
        if !(0.0..=1.0).contains(&self.factor) {
            return Err(CurveError::InvalidFactor {
                position,
                factor: self.factor,
            });
        }
        Ok(())
    }
}

/// `p1 * factor + p2 * (1 - factor)` per coordinate, truncated toward zero.
///
/// The first product is taken in `f32` and the complement in `f64`, which
/// keeps output pixel-identical with the reference overlay. Equal
/// coordinates are returned as is.
pub fn lerp(p1: Point, p2: Point, factor: f32) -> Point {
    let blend = |a: i32, b: i32| {
        if a == b {
            return a;
        }
        let near = (a as f32 * factor) as f64;
        let far = b as f64 * (1.0 - factor as f64);
        (near + far) as i32
    };
    Point::new(blend(p1.x, p2.x), blend(p1.y, p2.y))
}

/// Replace both indices of every spec with their mirror images.
pub fn mirror(
    specs: &[ControlPointSpec],
    table: &SymmetryTable,
) -> Result<Vec<ControlPointSpec>, CurveError> {
    specs
        .iter()
        .map(|spec| -> Result<ControlPointSpec, CurveError> {
            let image = |index: usize| {
                table
                    .mirror_of(index)
                    .ok_or(CurveError::UnmappedLandmarkIndex(index))
            };
            Ok(ControlPointSpec::new(
                image(spec.start)?,
                image(spec.end)?,
                spec.factor,
            ))
        })
        .collect()
}

/// Evaluate every spec against `landmarks`, preserving spec order.
pub fn build_curve(
    landmarks: &[Point],
    specs: &[ControlPointSpec],
) -> Result<ClosedCurve, CurveError> {
    let len = landmarks.len();
    let at = |index: usize| {
        landmarks
            .get(index)
            .copied()
            .ok_or(CurveError::LandmarkIndexOutOfRange { index, len })
    };

    specs
        .iter()
        .map(|spec| -> Result<Point, CurveError> {
            Ok(lerp(at(spec.start)?, at(spec.end)?, spec.factor))
        })
        .collect()
}
