//! lidtrace-core — Eyelid overlay geometry.
//!
//! Turns a 68-point facial landmark set into closed quadratic-spline curves
//! outlining both eyelids, and strokes them onto a frame buffer.

pub mod detector;
pub mod lids;
pub mod overlay;
pub mod spline;
pub mod symmetry;
pub mod types;

pub use detector::{DetectorError, LandmarkDetector};
pub use lids::LidTable;
pub use overlay::{draw_closed_spline, OverlayRenderer, PathSurface, PixmapSurface, StrokeStyle};
pub use spline::{build_curve, lerp, mirror, ControlPointSpec, CurveError};
pub use symmetry::SymmetryTable;
pub use types::{BoundingBox, ClosedCurve, FaceResult, Point, LANDMARK_COUNT};
