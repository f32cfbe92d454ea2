use serde::{Deserialize, Serialize};

/// Number of points in a facial landmark set (iBUG 300-W convention).
pub const LANDMARK_COUNT: usize = 68;

/// An integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Face bounds in working-buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One detected face: bounds plus its ordered landmark points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    pub bounding_box: BoundingBox,
    /// Landmarks indexed by the detector's fixed 68-point convention.
    pub landmarks: Vec<Point>,
}

/// Ordered points of a curve whose last point connects back to the first.
pub type ClosedCurve = Vec<Point>;
