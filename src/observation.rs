//! Detector output consumed by the skeleton, and utilities for recorded clips.

use serde::{Deserialize, Serialize};

use crate::error::{ObservationError, Result};
use crate::math::{Point2, Vector2};
use crate::skeleton::Keypoint;

/// One body keypoint reported by the pose detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseKeypoint {
    pub part: Keypoint,
    pub position: Point2,
    pub score: f64,
}

impl PoseKeypoint {
    #[must_use]
    pub fn new(part: Keypoint, position: Point2, score: f64) -> Self {
        Self {
            part,
            position,
            score,
        }
    }
}

/// A single pose detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseObservation {
    /// Overall detection score.
    pub score: f64,
    pub keypoints: Vec<PoseKeypoint>,
}

impl PoseObservation {
    #[must_use]
    pub fn new(score: f64, keypoints: Vec<PoseKeypoint>) -> Self {
        Self { score, keypoints }
    }

    /// Builds an observation from detector part names.
    ///
    /// # Errors
    ///
    /// Returns `ObservationError::UnknownPart` if a name is not a pose keypoint.
    pub fn from_named<'a, I>(score: f64, parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Point2, f64)>,
    {
        let keypoints = parts
            .into_iter()
            .map(|(name, position, score)| {
                let part = name
                    .parse::<Keypoint>()
                    .ok()
                    .filter(|kp| !kp.is_face())
                    .ok_or_else(|| ObservationError::UnknownPart(name.to_owned()))?;
                Ok(PoseKeypoint::new(part, position, score))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { score, keypoints })
    }

    /// Returns the first detection of `part`, if any.
    #[must_use]
    pub fn get(&self, part: Keypoint) -> Option<&PoseKeypoint> {
        self.keypoints.iter().find(|kp| kp.part == part)
    }

    /// Swaps left and right part labels, for mirrored camera input.
    pub fn flip(&mut self) {
        for kp in &mut self.keypoints {
            kp.part = kp.part.mirrored();
        }
    }

    fn map_positions(&mut self, f: impl Fn(&Point2) -> Point2) {
        for kp in &mut self.keypoints {
            kp.position = f(&kp.position);
        }
    }
}

/// A single face landmark detection.
///
/// `positions` follow the order of [`Keypoint::FACE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Confidence that a face is in view.
    pub confidence: f64,
    pub positions: Vec<Point2>,
}

impl FaceObservation {
    #[must_use]
    pub fn new(confidence: f64, positions: Vec<Point2>) -> Self {
        Self {
            confidence,
            positions,
        }
    }

    /// Picks the named landmarks out of a full face mesh.
    ///
    /// # Errors
    ///
    /// Returns `ObservationError::MeshTooShort` if the mesh does not contain
    /// every landmark index.
    pub fn from_mesh(confidence: f64, mesh: &[Point2]) -> Result<Self> {
        let positions = Keypoint::FACE
            .iter()
            .filter_map(|kp| kp.mesh_index())
            .map(|i| {
                mesh.get(i)
                    .copied()
                    .ok_or_else(|| ObservationError::MeshTooShort {
                        expected: required_mesh_len(),
                        actual: mesh.len(),
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            confidence,
            positions,
        })
    }

    /// Position of a face landmark, if present.
    #[must_use]
    pub fn position(&self, part: Keypoint) -> Option<Point2> {
        part.face_index()
            .and_then(|i| self.positions.get(i))
            .copied()
    }

    /// Swaps left and right landmarks, for mirrored camera input.
    pub fn flip(&mut self) {
        for &kp in Keypoint::FACE {
            if !kp.name().starts_with("left") {
                continue;
            }
            let (Some(a), Some(b)) = (kp.face_index(), kp.mirrored().face_index()) else {
                continue;
            };
            if a != b && a < self.positions.len() && b < self.positions.len() {
                self.positions.swap(a, b);
            }
        }
    }

    fn map_positions(&mut self, f: impl Fn(&Point2) -> Point2) {
        for p in &mut self.positions {
            *p = f(p);
        }
    }
}

fn required_mesh_len() -> usize {
    Keypoint::FACE
        .iter()
        .filter_map(|kp| kp.mesh_index())
        .max()
        .map_or(0, |i| i + 1)
}

/// Axis-aligned bounds of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    fn include(&mut self, p: &Point2) {
        self.min = Point2::new(self.min.x.min(p.x), self.min.y.min(p.y));
        self.max = Point2::new(self.max.x.max(p.x), self.max.y.max(p.y));
    }

    #[must_use]
    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }
}

/// One recorded frame of detector output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub pose: PoseObservation,
    #[serde(default)]
    pub face: Option<FaceObservation>,
}

/// A recorded sequence of frames, e.g. loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseClip {
    pub frames: Vec<PoseFrame>,
}

impl PoseClip {
    /// Bounds of every pose keypoint and face landmark in the clip.
    ///
    /// Returns `None` for a clip with no positions.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut points = self.frames.iter().flat_map(|frame| {
            let pose = frame.pose.keypoints.iter().map(|kp| kp.position);
            let face = frame.face.iter().flat_map(|f| f.positions.iter().copied());
            pose.chain(face)
        });
        let first = points.next()?;
        let mut bounds = BoundingBox {
            min: first,
            max: first,
        };
        for p in points {
            bounds.include(&p);
        }
        Some(bounds)
    }

    /// Moves every position in the clip by `d`.
    pub fn translate(&mut self, d: &Vector2) {
        self.map_positions(|p| p + d);
    }

    /// Scales every position about `origin`, independently per axis.
    pub fn resize(&mut self, origin: &Point2, scale: &Vector2) {
        self.map_positions(|p| origin + (p - origin).component_mul(scale));
    }

    fn map_positions(&mut self, f: impl Fn(&Point2) -> Point2) {
        for frame in &mut self.frames {
            frame.pose.map_positions(&f);
            if let Some(face) = &mut frame.face {
                face.map_positions(&f);
            }
        }
    }
}
