//! Detector that replays recorded landmark sets from a JSON file.
//!
//! Stands in for a live landmark model when running single frames from the
//! command line. The file holds a list of faces in working-buffer
//! coordinates:
//!
//! ```json
//! [{ "bounding_box": { "left": 0, "top": 0, "right": 10, "bottom": 10 },
//!    "landmarks": [{ "x": 1, "y": 2 }, ...] }]
//! ```

use lidtrace_core::detector::{check_landmark_counts, DetectorError};
use lidtrace_core::{FaceResult, LandmarkDetector};
use lidtrace_frame::RgbBuffer;
use std::path::Path;

pub struct ReplayDetector {
    faces: Vec<FaceResult>,
}

impl ReplayDetector {
    /// Load and validate recorded faces.
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| DetectorError::Unavailable(format!("{}: {e}", path.display())))?;
        let detector = Self::from_json(&src)?;
        tracing::info!(path = %path.display(), faces = detector.faces.len(), "loaded recorded landmarks");
        Ok(detector)
    }

    pub fn from_json(src: &str) -> Result<Self, DetectorError> {
        let faces: Vec<FaceResult> = serde_json::from_str(src)
            .map_err(|e| DetectorError::Unavailable(format!("bad landmark JSON: {e}")))?;
        check_landmark_counts(&faces)?;
        Ok(Self { faces })
    }
}

impl LandmarkDetector for ReplayDetector {
    fn detect(&mut self, image: &RgbBuffer) -> Result<Vec<FaceResult>, DetectorError> {
        tracing::trace!(width = image.width, height = image.height, "replaying recorded faces");
        Ok(self.faces.clone())
    }
}

impl Drop for ReplayDetector {
    fn drop(&mut self) {
        tracing::debug!("replay detector released");
    }
}
