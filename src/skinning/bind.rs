use tracing::{debug, warn};

use super::{SkinnedCurve, SkinnedPoint, SkinnedSegment, Weight, WeightSet};
use crate::artwork::{ArtworkGroup, ArtworkItem, SourceCurve, SourceSegment};
use crate::config::RigConfig;
use crate::error::{BindError, Result};
use crate::math::{is_collinear, Point2, Vector2, TOLERANCE};
use crate::skeleton::{BoneId, Skeleton};

/// Computes inverse-square distance weights of `p` against the rest pose of
/// `bones`.
///
/// Weights are normalized to sum to 1 and sorted by descending value. A
/// point lying on a bone belongs to that bone alone (the first such bone if
/// several touch it). An empty bone set yields an empty weight set.
#[must_use]
pub fn compute_weights(skeleton: &Skeleton, bones: &[BoneId], p: &Point2) -> WeightSet {
    let mut weights = WeightSet::new();
    for &id in bones {
        let Some(bone) = skeleton.bone(id) else {
            continue;
        };
        let d = bone.rest_distance(p);
        let transform = bone.point_transform(p);
        if d < TOLERANCE {
            weights.clear();
            weights.push(Weight {
                bone: id,
                value: 1.0,
                transform,
            });
            return weights;
        }
        weights.push(Weight {
            bone: id,
            value: 1.0 / (d * d),
            transform,
        });
    }

    let total: f64 = weights.iter().map(|w| w.value).sum();
    if total <= 0.0 || !total.is_finite() {
        return WeightSet::new();
    }
    for w in &mut weights {
        w.value /= total;
    }
    weights.sort_by(|a, b| b.value.total_cmp(&a.value));
    weights
}

/// Reuses the bones and values of `weights` for another point, capturing
/// fresh per-bone transforms for `p`.
fn share_weights(skeleton: &Skeleton, weights: &WeightSet, p: &Point2) -> WeightSet {
    weights
        .iter()
        .filter_map(|w| {
            let bone = skeleton.bone(w.bone)?;
            Some(Weight {
                transform: bone.point_transform(p),
                ..*w
            })
        })
        .collect()
}

/// Binds artwork to a skeleton, replacing any previous binding.
///
/// Previously created secondary bones are removed first, so executing the
/// same binding twice yields the same skeleton and curves.
pub struct BindArtwork<'a> {
    items: &'a [ArtworkItem],
    config: RigConfig,
}

impl<'a> BindArtwork<'a> {
    /// Creates a new `BindArtwork` operation.
    #[must_use]
    pub fn new(items: &'a [ArtworkItem], config: RigConfig) -> Self {
        Self { items, config }
    }

    /// Executes the binding, adding secondary bones for artwork groups.
    ///
    /// On failure the skeleton is left with no secondary bones.
    ///
    /// # Errors
    ///
    /// Returns a `BindError` if a curve has no segments, names an empty or
    /// unknown explicit bone set.
    pub fn execute(&self, skeleton: &mut Skeleton) -> Result<Vec<SkinnedCurve>> {
        skeleton.clear_secondary_bones();

        match self.bind_items(skeleton) {
            Ok(curves) => {
                debug!(
                    curves = curves.len(),
                    secondary_bones = skeleton.secondary_bones().len(),
                    "artwork bound"
                );
                Ok(curves)
            }
            Err(err) => {
                skeleton.clear_secondary_bones();
                Err(err)
            }
        }
    }

    fn bind_items(&self, skeleton: &mut Skeleton) -> Result<Vec<SkinnedCurve>> {
        let mut curves = Vec::new();
        for item in self.items {
            match item {
                ArtworkItem::Curve(curve) => curves.push(self.bind_curve(skeleton, curve, None)?),
                ArtworkItem::Group(group) => self.bind_group(skeleton, group, &mut curves)?,
            }
        }
        Ok(curves)
    }

    fn bind_group(
        &self,
        skeleton: &mut Skeleton,
        group: &ArtworkGroup,
        curves: &mut Vec<SkinnedCurve>,
    ) -> Result<()> {
        let matches: Vec<(BoneId, [Point2; 2])> = skeleton
            .primary_bones()
            .filter_map(|id| {
                let (a, b) = skeleton.bone(id)?.keypoints();
                Some((id, [group.marker(a)?, group.marker(b)?]))
            })
            .collect();

        let mut bones = Vec::with_capacity(matches.len());
        for (parent, rest) in matches {
            bones.push(skeleton.add_secondary_bone(parent, rest)?);
        }

        if bones.is_empty() {
            warn!(
                group = %group.name,
                "no bone matches the group markers, binding to nearest bones"
            );
        } else {
            debug!(group = %group.name, bones = bones.len(), "secondary bones created");
        }

        let fixed = (!bones.is_empty()).then_some(bones.as_slice());
        for curve in &group.curves {
            curves.push(self.bind_curve(skeleton, curve, fixed)?);
        }
        Ok(())
    }

    /// Binds one curve. The curve's own explicit bones take precedence over
    /// `fixed`; with neither, each segment uses its nearest bone group.
    fn bind_curve(
        &self,
        skeleton: &Skeleton,
        curve: &SourceCurve,
        fixed: Option<&[BoneId]>,
    ) -> Result<SkinnedCurve> {
        if curve.segments.is_empty() {
            return Err(BindError::EmptyCurve(curve.name.clone()).into());
        }

        let explicit = match &curve.bones {
            None => None,
            Some(pairs) if pairs.is_empty() => {
                return Err(BindError::EmptyBoneSet(curve.name.clone()).into());
            }
            Some(pairs) => Some(
                pairs
                    .iter()
                    .map(|&(a, b)| {
                        skeleton
                            .primary_bone(a, b)
                            .ok_or_else(|| BindError::BoneNotFound(curve.name.clone()))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            ),
        };
        let fixed = explicit.as_deref().or(fixed);

        let segments = curve
            .segments
            .iter()
            .map(|segment| self.bind_segment(skeleton, segment, fixed))
            .collect();

        Ok(SkinnedCurve {
            name: curve.name.clone(),
            segments,
            style: curve.style,
            closed: curve.closed,
            confidence: 0.0,
        })
    }

    fn bind_segment(
        &self,
        skeleton: &Skeleton,
        segment: &SourceSegment,
        fixed: Option<&[BoneId]>,
    ) -> SkinnedSegment {
        let point = segment.point;
        let nearest;
        let bones = match fixed {
            Some(bones) => bones,
            None => {
                nearest = skeleton.find_bone_group(&point);
                nearest.as_slice()
            }
        };

        let collinear = match (&segment.handle_in, &segment.handle_out) {
            (Some(h_in), Some(h_out)) => is_collinear(h_in, h_out, self.config.collinear_threshold),
            _ => false,
        };
        let point_weights = compute_weights(skeleton, bones, &point);
        let bind_handle = |offset: &Vector2| {
            let p = point + offset;
            let weights = if collinear {
                share_weights(skeleton, &point_weights, &p)
            } else {
                compute_weights(skeleton, bones, &p)
            };
            SkinnedPoint::new(p, weights)
        };

        let handle_in = segment.handle_in.as_ref().map(&bind_handle);
        let handle_out = segment.handle_out.as_ref().map(&bind_handle);
        SkinnedSegment {
            point: SkinnedPoint::new(point, point_weights),
            handle_in,
            handle_out,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::artwork::Marker;
    use crate::error::MarionetteError;
    use crate::skeleton::fixtures::rest_pose;
    use crate::skeleton::{BoneGroup, Keypoint};

    fn skeleton() -> Skeleton {
        Skeleton::new(&rest_pose(), RigConfig::default()).unwrap()
    }

    fn bind(skeleton: &mut Skeleton, items: &[ArtworkItem]) -> Result<Vec<SkinnedCurve>> {
        BindArtwork::new(items, RigConfig::default()).execute(skeleton)
    }

    #[test]
    fn weights_are_normalized_and_sorted() {
        let s = skeleton();
        for p in [
            Point2::new(10.0, 150.0),
            Point2::new(-55.0, 190.0),
            Point2::new(3.0, 45.0),
            Point2::new(0.0, 400.0),
        ] {
            let bones = s.find_bone_group(&p);
            let weights = compute_weights(&s, &bones, &p);
            assert!(!weights.is_empty());
            let total: f64 = weights.iter().map(|w| w.value).sum();
            assert!((total - 1.0).abs() < 1e-6, "sum {total} at {p}");
            assert!(weights.windows(2).all(|w| w[0].value >= w[1].value));
            assert!(weights.iter().all(|w| (0.0..=1.0).contains(&w.transform.anchor_percent)));
        }
    }

    #[test]
    fn nearer_bone_gets_more_weight() {
        let s = skeleton();
        let bones = s.group(BoneGroup::LeftArm);
        let p = Point2::new(75.0, 150.0);
        let weights = compute_weights(&s, bones, &p);
        let upper = s.primary_bone(Keypoint::LeftShoulder, Keypoint::LeftElbow).unwrap();
        assert_eq!(weights[0].bone, upper);
    }

    #[test]
    fn point_on_bone_gets_single_full_weight() {
        let s = skeleton();
        let bones = s.group(BoneGroup::LeftLeg);
        // Midpoint of the left shin.
        let weights = compute_weights(&s, bones, &Point2::new(35.0, 340.0));
        assert_eq!(weights.len(), 1);
        assert_relative_eq!(weights[0].value, 1.0);
        assert_eq!(
            weights[0].bone,
            s.primary_bone(Keypoint::LeftKnee, Keypoint::LeftAnkle).unwrap()
        );
    }

    #[test]
    fn point_on_shared_joint_takes_first_bone() {
        let s = skeleton();
        let bones = s.group(BoneGroup::LeftLeg);
        let weights = compute_weights(&s, bones, &Point2::new(35.0, 300.0));
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[0].bone, bones[0]);
    }

    #[test]
    fn empty_bone_set_gives_empty_weights() {
        let s = skeleton();
        assert!(compute_weights(&s, &[], &Point2::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn collinear_handles_share_point_weights() {
        let mut s = skeleton();
        let curve = SourceCurve::new(
            "smooth",
            vec![SourceSegment::smooth(
                Point2::new(60.0, 170.0),
                Vector2::new(-4.0, -6.0),
                Vector2::new(8.0, 12.0),
            )],
        );
        let curves = bind(&mut s, &[curve.into()]).unwrap();
        let seg = &curves[0].segments[0];
        let key = |p: &SkinnedPoint| -> Vec<(BoneId, f64)> {
            p.weights.iter().map(|w| (w.bone, w.value)).collect()
        };
        assert_eq!(key(seg.handle_in.as_ref().unwrap()), key(&seg.point));
        assert_eq!(key(seg.handle_out.as_ref().unwrap()), key(&seg.point));
        assert_eq!(seg.handle_in.as_ref().unwrap().rest, Point2::new(56.0, 164.0));
    }

    #[test]
    fn corner_handles_get_own_weights() {
        let mut s = skeleton();
        let curve = SourceCurve::new(
            "corner",
            vec![SourceSegment::smooth(
                Point2::new(60.0, 170.0),
                Vector2::new(-20.0, 0.0),
                Vector2::new(0.0, 30.0),
            )],
        );
        let curves = bind(&mut s, &[curve.into()]).unwrap();
        let seg = &curves[0].segments[0];
        let h_in = seg.handle_in.as_ref().unwrap();
        assert_ne!(h_in.weights[0].value, seg.point.weights[0].value);
    }

    #[test]
    fn explicit_bones_restrict_binding() {
        let mut s = skeleton();
        let curve = SourceCurve::polyline("belt", &[Point2::new(-30.0, 215.0), Point2::new(30.0, 215.0)])
            .with_bones(vec![(Keypoint::RightHip, Keypoint::LeftHip)]);
        let curves = bind(&mut s, &[curve.into()]).unwrap();
        let hips = s.primary_bone(Keypoint::LeftHip, Keypoint::RightHip).unwrap();
        for seg in &curves[0].segments {
            assert_eq!(seg.point.weights.len(), 1);
            assert_eq!(seg.point.weights[0].bone, hips);
        }
    }

    #[test]
    fn invalid_curves_are_rejected() {
        let mut s = skeleton();
        let empty = SourceCurve::new("empty", Vec::new());
        assert!(matches!(
            bind(&mut s, &[empty.into()]),
            Err(MarionetteError::Bind(BindError::EmptyCurve(_)))
        ));

        let no_bones = SourceCurve::polyline("a", &[Point2::origin()]).with_bones(Vec::new());
        assert!(matches!(
            bind(&mut s, &[no_bones.into()]),
            Err(MarionetteError::Bind(BindError::EmptyBoneSet(_)))
        ));

        let unknown = SourceCurve::polyline("b", &[Point2::origin()])
            .with_bones(vec![(Keypoint::LeftWrist, Keypoint::RightAnkle)]);
        assert!(matches!(
            bind(&mut s, &[unknown.into()]),
            Err(MarionetteError::Bind(BindError::BoneNotFound(name))) if name == "b"
        ));
    }

    fn glasses(s: &Skeleton) -> ArtworkGroup {
        let lift = Vector2::new(0.0, -2.0);
        let rest = s.rest_pose();
        let mut group = ArtworkGroup::new("glasses");
        for kp in [Keypoint::LeftEye0, Keypoint::LeftEye1, Keypoint::LeftEye2] {
            group.markers.push(Marker {
                keypoint: kp,
                position: rest.get(kp).unwrap() + lift,
            });
        }
        let p0 = rest.get(Keypoint::LeftEye0).unwrap();
        let p1 = rest.get(Keypoint::LeftEye2).unwrap();
        group.with_curve(SourceCurve::polyline("lens", &[p0, p1]))
    }

    #[test]
    fn group_binds_to_secondary_bones() {
        let mut s = skeleton();
        let group = glasses(&s);
        let curves = bind(&mut s, &[group.into()]).unwrap();

        // leftEye0-leftEye1 and leftEye1-leftEye2 both have markers.
        assert_eq!(s.secondary_bones().len(), 2);
        for seg in &curves[0].segments {
            for w in &seg.point.weights {
                assert!(s.secondary_bones().contains(&w.bone));
            }
        }
    }

    #[test]
    fn group_without_matching_bones_binds_to_nearest() {
        let mut s = skeleton();
        let group = ArtworkGroup::new("hat")
            .with_marker(Keypoint::TopMid, Point2::new(0.0, 10.0))
            .with_curve(SourceCurve::polyline("brim", &[Point2::new(0.0, 20.0)]));
        let curves = bind(&mut s, &[group.into()]).unwrap();
        assert!(s.secondary_bones().is_empty());
        assert!(!curves[0].segments[0].point.weights.is_empty());
    }

    #[test]
    fn failed_bind_removes_group_bones() {
        let mut s = skeleton();
        let primary = s.bones().count();
        let items: Vec<ArtworkItem> = vec![
            glasses(&s).into(),
            SourceCurve::new("empty", Vec::new()).into(),
        ];
        assert!(matches!(
            bind(&mut s, &items),
            Err(MarionetteError::Bind(BindError::EmptyCurve(_)))
        ));
        assert!(s.secondary_bones().is_empty());
        assert_eq!(s.bones().count(), primary);
    }

    #[test]
    fn rebinding_replaces_secondary_bones() {
        let mut s = skeleton();
        let items: Vec<ArtworkItem> = vec![glasses(&s).into()];
        let first = bind(&mut s, &items).unwrap();
        let count = s.secondary_bones().len();
        let second = bind(&mut s, &items).unwrap();
        assert_eq!(s.secondary_bones().len(), count);
        assert_eq!(first.len(), second.len());
        let bones = s.bones().count();
        bind(&mut s, &[]).unwrap();
        assert_eq!(s.bones().count(), bones - count);
    }
}
