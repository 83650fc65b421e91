pub mod bone;
mod fusion;
pub mod keypoint;
pub mod topology;

pub use bone::{Bone, BoneId, BoneKind, BoneRole, PointTransform};
pub use fusion::FusedPart;
pub use keypoint::Keypoint;
pub use topology::{BoneGroup, FACE_FRAME, NOSE};

use slotmap::SlotMap;
use tracing::debug;

use crate::config::RigConfig;
use crate::error::{Result, SkeletonError};
use crate::math::{FrameTransform, Point2, TOLERANCE};
use crate::observation::{FaceObservation, PoseObservation};

/// Rest positions of the skeleton's keypoints, as drawn in the artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct RestPose {
    positions: [Option<Point2>; Keypoint::COUNT],
}

impl Default for RestPose {
    fn default() -> Self {
        Self::new()
    }
}

impl RestPose {
    /// Creates an empty rest pose.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: [None; Keypoint::COUNT],
        }
    }

    /// Builds a rest pose from keypoint names, e.g. marker names found in
    /// imported artwork.
    ///
    /// # Errors
    ///
    /// Returns `SkeletonError::UnknownKeypoint` for an unrecognized name.
    pub fn from_named<'a, I>(markers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Point2)>,
    {
        let mut rest = Self::new();
        for (name, position) in markers {
            rest.set(name.parse()?, position);
        }
        Ok(rest)
    }

    /// Returns `self` with `keypoint` placed at `position`.
    #[must_use]
    pub fn with(mut self, keypoint: Keypoint, position: Point2) -> Self {
        self.set(keypoint, position);
        self
    }

    pub fn set(&mut self, keypoint: Keypoint, position: Point2) {
        self.positions[keypoint.index()] = Some(position);
    }

    #[must_use]
    pub fn get(&self, keypoint: Keypoint) -> Option<Point2> {
        self.positions[keypoint.index()]
    }
}

impl FromIterator<(Keypoint, Point2)> for RestPose {
    fn from_iter<T: IntoIterator<Item = (Keypoint, Point2)>>(iter: T) -> Self {
        let mut rest = Self::new();
        for (keypoint, position) in iter {
            rest.set(keypoint, position);
        }
        rest
    }
}

/// A full body and face skeleton tracking one subject.
///
/// Primary bones are fixed by [`BoneGroup`] topology and follow fused
/// detector keypoints. Secondary bones are added at bind time and follow a
/// primary parent bone. All bones live in one arena keyed by [`BoneId`].
#[derive(Debug)]
pub struct Skeleton {
    config: RigConfig,
    rest: RestPose,
    parts: [Option<FusedPart>; Keypoint::COUNT],
    bones: SlotMap<BoneId, Bone>,
    groups: Vec<(BoneGroup, Vec<BoneId>)>,
    body_bones: Vec<BoneId>,
    face_bones: Vec<BoneId>,
    secondary: Vec<BoneId>,
    /// Every face-bone keypoint relative to the rest jaw frame.
    face_base: Vec<(Keypoint, FrameTransform)>,
    /// Ear → (left jaw, right jaw) transforms from the last tracked face.
    ear_to_jaw: Option<[FrameTransform; 2]>,
    body_rest_length: f64,
    face_rest_length: f64,
    body_scale: f64,
    face_scale: f64,
    valid: bool,
}

impl Skeleton {
    /// Builds the skeleton from rest positions.
    ///
    /// # Errors
    ///
    /// Returns `SkeletonError::MissingKeypoint` if a keypoint used by any
    /// primary bone has no rest position, or a `ConfigError` if `config` is
    /// out of range.
    pub fn new(rest: &RestPose, config: RigConfig) -> Result<Self> {
        config.validate()?;

        let mut bones = SlotMap::with_key();
        let mut groups = Vec::with_capacity(BoneGroup::ALL.len());
        let mut body_bones = Vec::new();
        let mut face_bones = Vec::new();

        for group in BoneGroup::ALL {
            let kind = group.kind();
            let mut ids = Vec::with_capacity(group.members().len());
            for &(a, b) in group.members() {
                let pa = rest.get(a).ok_or(SkeletonError::MissingKeypoint(a))?;
                let pb = rest.get(b).ok_or(SkeletonError::MissingKeypoint(b))?;
                let id = bones.insert(Bone::new(a, b, kind, BoneRole::Primary, [pa, pb]));
                ids.push(id);
                match kind {
                    BoneKind::Body => body_bones.push(id),
                    BoneKind::Face => face_bones.push(id),
                }
            }
            groups.push((group, ids));
        }

        let face_base = face_base_transforms(rest, &bones, &face_bones)?;
        let total = |ids: &[BoneId]| ids.iter().map(|&id| bones[id].rest_length()).sum::<f64>();
        let body_rest_length = total(&body_bones);
        let face_rest_length = total(&face_bones);

        debug!(
            bones = bones.len(),
            body_rest_length, face_rest_length, "skeleton built"
        );

        Ok(Self {
            config,
            rest: rest.clone(),
            parts: [None; Keypoint::COUNT],
            bones,
            groups,
            body_bones,
            face_bones,
            secondary: Vec::new(),
            face_base,
            ear_to_jaw: None,
            body_rest_length,
            face_rest_length,
            body_scale: 1.0,
            face_scale: 1.0,
            valid: false,
        })
    }

    /// Fuses one frame of detector output into the skeleton.
    ///
    /// Returns whether the frame produced a valid pose. An invalid frame
    /// leaves bone positions as they were.
    pub fn update(&mut self, pose: &PoseObservation, face: Option<&FaceObservation>) -> bool {
        let was_valid = self.valid;
        self.valid = self.apply_frame(pose, face);
        if was_valid != self.valid {
            debug!(valid = self.valid, "skeleton validity changed");
        }
        self.valid
    }

    fn apply_frame(&mut self, pose: &PoseObservation, face: Option<&FaceObservation>) -> bool {
        if pose.score < self.config.min_pose_score {
            debug!(score = pose.score, "pose score below threshold");
            return false;
        }

        self.fuse_pose(pose);
        let ears = (
            self.parts[Keypoint::LeftEar.index()],
            self.parts[Keypoint::RightEar.index()],
        );
        let (Some(left_ear), Some(right_ear)) = ears else {
            debug!("ears not tracked yet");
            return false;
        };

        let face_tracked = self.fuse_face(face, &left_ear.position, &right_ear.position);
        self.update_primary_bones();
        self.update_secondary_bones();
        self.update_scales(face_tracked);
        true
    }

    /// Forgets all fused tracking state, e.g. before processing an
    /// unrelated still image.
    pub fn reset(&mut self) {
        self.parts = [None; Keypoint::COUNT];
        self.ear_to_jaw = None;
        self.valid = false;
    }

    fn update_primary_bones(&mut self) {
        for (_, ids) in &self.groups {
            for &id in ids {
                let bone = &mut self.bones[id];
                let start = self.parts[bone.start.index()];
                let end = self.parts[bone.end.index()];
                let (p0, s0) = start.map_or((bone.rest[0], 0.0), |p| (p.position, p.score));
                let (p1, s1) = end.map_or((bone.rest[1], 0.0), |p| (p.position, p.score));
                bone.current = [p0, p1];
                bone.score = (s0 + s1) / 2.0;
            }
        }
    }

    fn update_secondary_bones(&mut self) {
        let nose = self.current_position(NOSE);
        for &id in &self.secondary {
            let Some(BoneRole::Secondary { parent, start, end }) =
                self.bones.get(id).map(|b| b.role.clone())
            else {
                continue;
            };
            let Some((parent_current, parent_score)) =
                self.bones.get(parent).map(|p| (p.current, p.score))
            else {
                continue;
            };
            let bone = &mut self.bones[id];
            bone.current = [
                start.apply(&parent_current[0], &nose),
                end.apply(&parent_current[1], &nose),
            ];
            bone.score = parent_score;
        }
    }

    fn update_scales(&mut self, face_tracked: bool) {
        let current = |ids: &[BoneId]| {
            ids.iter()
                .filter_map(|&id| self.bones.get(id))
                .map(Bone::current_length)
                .sum::<f64>()
        };
        self.body_scale = length_ratio(current(&self.body_bones), self.body_rest_length);
        self.face_scale = if face_tracked {
            length_ratio(current(&self.face_bones), self.face_rest_length)
        } else {
            self.body_scale
        };
    }

    /// Adds a bone that follows `parent`, with rest endpoints at `rest`.
    ///
    /// Each endpoint is captured relative to the matching parent endpoint
    /// and the nose, so the new bone keeps its placement relative to the
    /// face as the parent moves.
    ///
    /// # Errors
    ///
    /// Returns `SkeletonError::BoneNotFound` if `parent` is not a primary bone.
    pub fn add_secondary_bone(&mut self, parent: BoneId, rest: [Point2; 2]) -> Result<BoneId> {
        let parent_bone = self
            .bones
            .get(parent)
            .filter(|b| b.parent().is_none())
            .ok_or(SkeletonError::BoneNotFound)?;
        let nose_rest = self.rest.get(NOSE).ok_or(SkeletonError::MissingKeypoint(NOSE))?;
        let start = FrameTransform::new(&parent_bone.rest[0], &nose_rest, &rest[0]);
        let end = FrameTransform::new(&parent_bone.rest[1], &nose_rest, &rest[1]);

        let nose = self.current_position(NOSE);
        let mut bone = Bone::new(
            parent_bone.start,
            parent_bone.end,
            parent_bone.kind,
            BoneRole::Secondary { parent, start, end },
            rest,
        );
        bone.current = [
            start.apply(&parent_bone.current[0], &nose),
            end.apply(&parent_bone.current[1], &nose),
        ];
        bone.score = parent_bone.score;

        let id = self.bones.insert(bone);
        self.secondary.push(id);
        Ok(id)
    }

    /// Removes every secondary bone.
    pub fn clear_secondary_bones(&mut self) {
        for id in self.secondary.drain(..) {
            self.bones.remove(id);
        }
    }

    /// Returns the bones of the group(s) nearest to `point` at rest.
    ///
    /// Every group whose closest bone ties the global minimum distance
    /// contributes all of its bones.
    #[must_use]
    pub fn find_bone_group(&self, point: &Point2) -> Vec<BoneId> {
        let distances: Vec<f64> = self
            .groups
            .iter()
            .map(|(_, ids)| {
                ids.iter()
                    .filter_map(|&id| self.bones.get(id))
                    .map(|b| b.rest_distance(point))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);

        self.groups
            .iter()
            .zip(&distances)
            .filter(|(_, &d)| d <= min)
            .flat_map(|((_, ids), _)| ids.iter().copied())
            .collect()
    }

    /// Current position of a keypoint: fused if tracked, rest otherwise.
    #[must_use]
    pub fn current_position(&self, keypoint: Keypoint) -> Point2 {
        self.parts[keypoint.index()]
            .map(|p| p.position)
            .or_else(|| self.rest.get(keypoint))
            .unwrap_or_else(Point2::origin)
    }

    /// Fused state of a keypoint, if it has been observed.
    #[must_use]
    pub fn part(&self, keypoint: Keypoint) -> Option<FusedPart> {
        self.parts[keypoint.index()]
    }

    #[must_use]
    pub fn rest_pose(&self) -> &RestPose {
        &self.rest
    }

    #[must_use]
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id)
    }

    /// Iterates over every bone, primary and secondary.
    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones.iter()
    }

    /// Iterates over primary bones in group order.
    pub fn primary_bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.groups.iter().flat_map(|(_, ids)| ids.iter().copied())
    }

    /// Finds the primary bone between two keypoints, in either direction.
    #[must_use]
    pub fn primary_bone(&self, a: Keypoint, b: Keypoint) -> Option<BoneId> {
        self.primary_bones().find(|&id| {
            let bone = &self.bones[id];
            (bone.start, bone.end) == (a, b) || (bone.start, bone.end) == (b, a)
        })
    }

    /// Bones of a named group.
    #[must_use]
    pub fn group(&self, group: BoneGroup) -> &[BoneId] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn secondary_bones(&self) -> &[BoneId] {
        &self.secondary
    }

    /// Whether the last update produced a usable pose.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[must_use]
    pub fn body_scale(&self) -> f64 {
        self.body_scale
    }

    #[must_use]
    pub fn face_scale(&self) -> f64 {
        self.face_scale
    }

    /// Scale applied to local offsets of bones of `kind`.
    #[must_use]
    pub fn scale(&self, kind: BoneKind) -> f64 {
        match kind {
            BoneKind::Body => self.body_scale,
            BoneKind::Face => self.face_scale,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RigConfig {
        &self.config
    }
}

/// Captures every face-bone keypoint in the frame of the rest jaw pair.
fn face_base_transforms(
    rest: &RestPose,
    bones: &SlotMap<BoneId, Bone>,
    face_bones: &[BoneId],
) -> Result<Vec<(Keypoint, FrameTransform)>> {
    let (left, right) = FACE_FRAME;
    let left = rest.get(left).ok_or(SkeletonError::MissingKeypoint(left))?;
    let right = rest.get(right).ok_or(SkeletonError::MissingKeypoint(right))?;

    let mut seen = [false; Keypoint::COUNT];
    let mut base = Vec::new();
    for &id in face_bones {
        let bone = &bones[id];
        for (kp, p) in [(bone.start, bone.rest[0]), (bone.end, bone.rest[1])] {
            if !std::mem::replace(&mut seen[kp.index()], true) {
                base.push((kp, FrameTransform::new(&left, &right, &p)));
            }
        }
    }
    Ok(base)
}

fn length_ratio(current: f64, rest: f64) -> f64 {
    if rest < TOLERANCE {
        1.0
    } else {
        current / rest
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Keypoint, RestPose};
    use crate::math::Point2;
    use crate::observation::{FaceObservation, PoseKeypoint, PoseObservation};

    /// Head centre of the fixture rest pose.
    pub(crate) fn head() -> Point2 {
        Point2::new(0.0, 40.0)
    }

    pub(crate) fn body_position(kp: Keypoint) -> Option<Point2> {
        let p = match kp {
            Keypoint::LeftShoulder => (40.0, 100.0),
            Keypoint::RightShoulder => (-40.0, 100.0),
            Keypoint::LeftElbow => (70.0, 160.0),
            Keypoint::LeftWrist => (90.0, 220.0),
            Keypoint::RightElbow => (-70.0, 160.0),
            Keypoint::RightWrist => (-90.0, 220.0),
            Keypoint::LeftHip => (30.0, 220.0),
            Keypoint::RightHip => (-30.0, 220.0),
            Keypoint::LeftKnee => (35.0, 300.0),
            Keypoint::LeftAnkle => (35.0, 380.0),
            Keypoint::RightKnee => (-35.0, 300.0),
            Keypoint::RightAnkle => (-35.0, 380.0),
            Keypoint::LeftEar => (25.0, 40.0),
            Keypoint::RightEar => (-25.0, 40.0),
            _ => return None,
        };
        Some(Point2::new(p.0, p.1))
    }

    /// Face landmarks on a spiral around the head centre; every landmark
    /// gets a distinct position.
    pub(crate) fn face_position(kp: Keypoint) -> Option<Point2> {
        let i = f64::from(u32::try_from(kp.face_index()?).ok()?);
        let angle = i * 0.7;
        let radius = 4.0 + i * 0.25;
        Some(head() + nalgebra::Vector2::new(angle.cos(), angle.sin()) * radius)
    }

    pub(crate) fn rest_pose() -> RestPose {
        Keypoint::ALL
            .iter()
            .filter_map(|&kp| body_position(kp).or_else(|| face_position(kp)).map(|p| (kp, p)))
            .collect()
    }

    /// A pose observation with every body keypoint at `f(rest)`.
    pub(crate) fn pose_with(score: f64, f: impl Fn(Point2) -> Point2) -> PoseObservation {
        let keypoints = Keypoint::POSE
            .iter()
            .filter_map(|&kp| body_position(kp).map(|p| PoseKeypoint::new(kp, f(p), score)))
            .collect();
        PoseObservation::new(score, keypoints)
    }

    pub(crate) fn rest_observation(score: f64) -> PoseObservation {
        pose_with(score, |p| p)
    }

    /// A face observation with every landmark at `f(rest)`.
    pub(crate) fn face_with(confidence: f64, f: impl Fn(Point2) -> Point2) -> FaceObservation {
        let positions = Keypoint::FACE
            .iter()
            .filter_map(|&kp| face_position(kp).map(&f))
            .collect();
        FaceObservation::new(confidence, positions)
    }
}
