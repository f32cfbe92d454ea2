//! The landmark detector seam.
//!
//! Detection itself lives outside this workspace; anything that can turn a
//! square working buffer into 68-point landmark sets plugs in here.

use crate::types::{FaceResult, LANDMARK_COUNT};
use lidtrace_frame::RgbBuffer;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("detection failed: {0}")]
    DetectionFailed(String),
    #[error("face {face} has {actual} landmarks, expected {expected}")]
    LandmarkCount {
        face: usize,
        expected: usize,
        actual: usize,
    },
}

/// Produces faces with ordered 68-point landmark sets.
///
/// Implementations own their model resources and release them on drop.
pub trait LandmarkDetector {
    fn detect(&mut self, image: &RgbBuffer) -> Result<Vec<FaceResult>, DetectorError>;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for Box<D> {
    fn detect(&mut self, image: &RgbBuffer) -> Result<Vec<FaceResult>, DetectorError> {
        (**self).detect(image)
    }
}

/// Check that every face carries exactly [`LANDMARK_COUNT`] landmarks.
pub fn check_landmark_counts(faces: &[FaceResult]) -> Result<(), DetectorError> {
    for (face, result) in faces.iter().enumerate() {
        if result.landmarks.len() != LANDMARK_COUNT {
            return Err(DetectorError::LandmarkCount {
                face,
                expected: LANDMARK_COUNT,
                actual: result.landmarks.len(),
            });
        }
    }
    Ok(())
}
