use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Thresholds that gate tracking, fallback, and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Pose detections scoring below this are ignored for the frame.
    pub min_pose_score: f64,
    /// Face detections must exceed this confidence to drive face keypoints.
    pub min_face_score: f64,
    /// Curves whose confidence falls below this are flagged as suppressed.
    pub min_curve_confidence: f64,
    /// Handles are treated as collinear with their point when the absolute
    /// cosine between them exceeds `1 - collinear_threshold`.
    pub collinear_threshold: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            min_pose_score: 0.1,
            min_face_score: 0.8,
            min_curve_confidence: 0.3,
            collinear_threshold: 0.01,
        }
    }
}

impl RigConfig {
    /// Checks that every threshold lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParameterOutOfRange` for the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("min_pose_score", self.min_pose_score),
            ("min_face_score", self.min_face_score),
            ("min_curve_confidence", self.min_curve_confidence),
            ("collinear_threshold", self.collinear_threshold),
        ];
        for (parameter, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ParameterOutOfRange {
                    parameter,
                    value,
                    min: 0.0,
                    max: 1.0,
                }
                .into());
            }
        }
        Ok(())
    }
}
