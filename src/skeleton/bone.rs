use serde::{Deserialize, Serialize};

use super::Keypoint;
use crate::math::{closest_point_on_segment, lerp, rotate90, FrameTransform, Point2, Vector2, TOLERANCE};

slotmap::new_key_type! {
    /// Unique identifier for a bone in a skeleton.
    pub struct BoneId;
}

/// Which scale factor a bone's local offsets are multiplied by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoneKind {
    Body,
    Face,
}

/// Whether a bone is driven by tracking or follows another bone.
#[derive(Debug, Clone)]
pub enum BoneRole {
    /// Endpoints come straight from fused keypoints.
    Primary,
    /// Endpoints are inferred from a primary bone and the nose.
    Secondary {
        /// The primary bone this bone follows.
        parent: BoneId,
        /// Start endpoint relative to (parent start, nose).
        start: FrameTransform,
        /// End endpoint relative to (parent end, nose).
        end: FrameTransform,
    },
}

/// Position of a point relative to one bone, captured at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTransform {
    /// Offset from the anchor along the bone direction.
    pub along: f64,
    /// Offset from the anchor along the bone normal.
    pub perp: f64,
    /// Position of the anchor on the bone, in `[0, 1]`.
    pub anchor_percent: f64,
}

/// A rigid segment between two keypoints.
#[derive(Debug, Clone)]
pub struct Bone {
    pub(crate) start: Keypoint,
    pub(crate) end: Keypoint,
    pub(crate) kind: BoneKind,
    pub(crate) role: BoneRole,
    pub(crate) rest: [Point2; 2],
    pub(crate) current: [Point2; 2],
    pub(crate) score: f64,
}

impl Bone {
    /// Creates a bone at rest between two positions.
    #[must_use]
    pub(crate) fn new(
        start: Keypoint,
        end: Keypoint,
        kind: BoneKind,
        role: BoneRole,
        rest: [Point2; 2],
    ) -> Self {
        Self {
            start,
            end,
            kind,
            role,
            rest,
            current: rest,
            score: 0.0,
        }
    }

    /// Returns the bone name, `"<start>-<end>"`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// Returns the start and end keypoints.
    #[must_use]
    pub fn keypoints(&self) -> (Keypoint, Keypoint) {
        (self.start, self.end)
    }

    #[must_use]
    pub fn kind(&self) -> BoneKind {
        self.kind
    }

    #[must_use]
    pub fn role(&self) -> &BoneRole {
        &self.role
    }

    /// Returns the parent bone for secondary bones.
    #[must_use]
    pub fn parent(&self) -> Option<BoneId> {
        match self.role {
            BoneRole::Primary => None,
            BoneRole::Secondary { parent, .. } => Some(parent),
        }
    }

    /// Rest-pose endpoints.
    #[must_use]
    pub fn rest(&self) -> &[Point2; 2] {
        &self.rest
    }

    /// Endpoints in the current frame.
    #[must_use]
    pub fn current(&self) -> &[Point2; 2] {
        &self.current
    }

    /// Tracking confidence of the current frame, in `[0, 1]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn rest_length(&self) -> f64 {
        nalgebra::distance(&self.rest[0], &self.rest[1])
    }

    #[must_use]
    pub fn current_length(&self) -> f64 {
        nalgebra::distance(&self.current[0], &self.current[1])
    }

    /// Distance from `p` to the rest-pose segment.
    #[must_use]
    pub fn rest_distance(&self, p: &Point2) -> f64 {
        closest_point_on_segment(&self.rest[0], &self.rest[1], p).distance
    }

    /// Describes `p` relative to this bone at rest.
    ///
    /// The anchor is the point on the rest segment closest to `p`; the
    /// offsets are `p - anchor` in the bone's direction/normal frame. A
    /// zero-length rest bone uses the world axes as its frame.
    #[must_use]
    pub fn point_transform(&self, p: &Point2) -> PointTransform {
        let [p0, p1] = &self.rest;
        let proj = closest_point_on_segment(p0, p1, p);
        let dir = direction(p0, p1).unwrap_or_else(|| Vector2::new(1.0, 0.0));
        let n = rotate90(&dir);
        let v = p - proj.point;
        PointTransform {
            along: v.dot(&dir),
            perp: v.dot(&n),
            anchor_percent: proj.t,
        }
    }

    /// Predicts the current position of a bound point.
    ///
    /// `scale` is the skeleton-wide scale for this bone's kind. A bone whose
    /// current length is zero collapses the prediction onto its anchor.
    #[must_use]
    pub fn predict(&self, transform: &PointTransform, scale: f64) -> Point2 {
        let [p0, p1] = &self.current;
        let anchor = self.current_anchor(transform.anchor_percent);
        let Some(dir) = direction(p0, p1) else {
            return anchor;
        };
        let n = rotate90(&dir);
        anchor + dir * (transform.along * scale) + n * (transform.perp * scale)
    }

    /// Point on the current segment at `t`.
    #[must_use]
    pub fn current_anchor(&self, t: f64) -> Point2 {
        lerp(&self.current[0], &self.current[1], t)
    }
}

/// Unit direction from `a` to `b`, or `None` for coincident points.
fn direction(a: &Point2, b: &Point2) -> Option<Vector2> {
    let d = b - a;
    let len = d.norm();
    (len >= TOLERANCE).then(|| d / len)
}
