//! Linear blend skinning of artwork curves onto a [`Skeleton`].
//!
//! [`BindArtwork`] computes per-point bone weights once against the rest
//! pose; [`SkinnedCurve::deform`] re-poses the bound points every frame and
//! [`SkinnedCurve::evaluate`] turns them into renderable output.
//!
//! [`Skeleton`]: crate::skeleton::Skeleton

pub mod bind;
pub mod deform;

pub use bind::{compute_weights, BindArtwork};
pub use deform::{EvaluatedCurve, EvaluatedPoint};

use smallvec::SmallVec;

use crate::artwork::Style;
use crate::math::Point2;
use crate::skeleton::{BoneId, PointTransform};

/// Influence of one bone on one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    pub bone: BoneId,
    /// Normalized weight; the weights of a point sum to 1.
    pub value: f64,
    /// Rest position of the point relative to `bone`.
    pub transform: PointTransform,
}

/// Weights of one point, sorted by descending value.
pub type WeightSet = SmallVec<[Weight; 8]>;

/// A bound point: where it was drawn, what moves it, where it is now.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedPoint {
    pub rest: Point2,
    pub weights: WeightSet,
    pub current: Point2,
}

impl SkinnedPoint {
    /// Creates a point that starts at its rest position.
    #[must_use]
    pub fn new(rest: Point2, weights: WeightSet) -> Self {
        Self {
            rest,
            weights,
            current: rest,
        }
    }
}

/// A bound anchor with optional bound handles.
///
/// Handles are stored as absolute positions here; evaluation turns them
/// back into offsets from the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedSegment {
    pub point: SkinnedPoint,
    pub handle_in: Option<SkinnedPoint>,
    pub handle_out: Option<SkinnedPoint>,
}

/// A curve bound to skeleton bones.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedCurve {
    pub name: String,
    pub segments: Vec<SkinnedSegment>,
    pub style: Style,
    pub closed: bool,
    /// Mean tracking confidence of the curve's anchors, from the last deform.
    pub confidence: f64,
}
