use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Keypoint, Skeleton, FACE_FRAME};
use crate::math::{FrameTransform, Point2};
use crate::observation::{FaceObservation, PoseObservation};

/// Temporally fused state of one keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedPart {
    pub position: Point2,
    pub score: f64,
}

impl FusedPart {
    /// Blends a new observation into `previous`, weighting each side by its
    /// share of the combined score.
    ///
    /// The first observation seeds the state. When both scores are zero the
    /// previous state is kept.
    #[must_use]
    pub fn fuse(previous: Option<Self>, position: Point2, score: f64) -> Self {
        let prev = previous.unwrap_or(Self { position, score });
        let total = prev.score + score;
        if total <= 0.0 {
            return prev;
        }
        let w_prev = prev.score / total;
        let w_new = score / total;
        Self {
            position: Point2::from(prev.position.coords * w_prev + position.coords * w_new),
            score: prev.score * w_prev + score * w_new,
        }
    }
}

impl Skeleton {
    pub(super) fn fuse_pose(&mut self, pose: &PoseObservation) {
        for kp in &pose.keypoints {
            let slot = &mut self.parts[kp.part.index()];
            *slot = Some(FusedPart::fuse(*slot, kp.position, kp.score));
        }
    }

    /// Sets face keypoints from a confident face observation, or infers them
    /// from the ears otherwise. Returns whether the face was tracked.
    pub(super) fn fuse_face(
        &mut self,
        face: Option<&FaceObservation>,
        left_ear: &Point2,
        right_ear: &Point2,
    ) -> bool {
        let min_score = self.config.min_face_score;
        if let Some(face) = face.filter(|f| f.confidence > min_score && !f.positions.is_empty()) {
            for (kp, position) in Keypoint::FACE.iter().zip(&face.positions) {
                self.parts[kp.index()] = Some(FusedPart {
                    position: *position,
                    score: face.confidence,
                });
            }
            self.capture_ear_to_jaw(left_ear, right_ear);
            return true;
        }

        trace!("face not tracked, inferring from ears");
        let (jaw_left, jaw_right) = match &self.ear_to_jaw {
            Some([l, r]) => (l.apply(left_ear, right_ear), r.apply(left_ear, right_ear)),
            None => (*left_ear, *right_ear),
        };
        for (kp, base) in &self.face_base {
            self.parts[kp.index()] = Some(FusedPart {
                position: base.apply(&jaw_left, &jaw_right),
                score: 1.0,
            });
        }
        false
    }

    fn capture_ear_to_jaw(&mut self, left_ear: &Point2, right_ear: &Point2) {
        let (left, right) = FACE_FRAME;
        if let (Some(l), Some(r)) = (self.parts[left.index()], self.parts[right.index()]) {
            self.ear_to_jaw = Some([
                FrameTransform::new(left_ear, right_ear, &l.position),
                FrameTransform::new(left_ear, right_ear, &r.position),
            ]);
        }
    }
}
