use serde::{Deserialize, Serialize};

use super::{SkinnedCurve, SkinnedPoint, SkinnedSegment};
use crate::artwork::Style;
use crate::math::{Point2, Vector2};
use crate::skeleton::Skeleton;

/// One evaluated anchor with the deformed positions of its handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPoint {
    pub position: Point2,
    pub handle_in_position: Option<Point2>,
    pub handle_out_position: Option<Point2>,
}

impl EvaluatedPoint {
    /// Incoming handle as an offset from `position`.
    #[must_use]
    pub fn handle_in(&self) -> Option<Vector2> {
        self.handle_in_position.map(|h| h - self.position)
    }

    /// Outgoing handle as an offset from `position`.
    #[must_use]
    pub fn handle_out(&self) -> Option<Vector2> {
        self.handle_out_position.map(|h| h - self.position)
    }
}

/// A curve ready to render for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedCurve {
    pub name: String,
    pub points: Vec<EvaluatedPoint>,
    pub style: Style,
    pub closed: bool,
    pub confidence: f64,
    /// Set when `confidence` is below the rendering threshold; callers
    /// should skip the curve.
    pub suppressed: bool,
}

impl SkinnedPoint {
    /// Blends the predictions of every weighted bone.
    ///
    /// A point with no weights stays at its rest position.
    #[must_use]
    pub fn predict(&self, skeleton: &Skeleton) -> Point2 {
        if self.weights.is_empty() {
            return self.rest;
        }
        let sum = self
            .weights
            .iter()
            .filter_map(|w| {
                let bone = skeleton.bone(w.bone)?;
                let p = bone.predict(&w.transform, skeleton.scale(bone.kind()));
                Some(p.coords * w.value)
            })
            .fold(Vector2::zeros(), |acc, v| acc + v);
        Point2::from(sum)
    }

    /// Weighted tracking confidence of the bones moving this point.
    #[must_use]
    pub fn confidence(&self, skeleton: &Skeleton) -> f64 {
        self.weights
            .iter()
            .filter_map(|w| skeleton.bone(w.bone).map(|b| b.score() * w.value))
            .sum()
    }

    fn deform(&mut self, skeleton: &Skeleton) {
        self.current = self.predict(skeleton);
    }
}

impl SkinnedSegment {
    fn deform(&mut self, skeleton: &Skeleton) {
        self.point.deform(skeleton);
        for handle in [&mut self.handle_in, &mut self.handle_out].into_iter().flatten() {
            handle.deform(skeleton);
        }
    }

    fn evaluate(&self) -> EvaluatedPoint {
        EvaluatedPoint {
            position: self.point.current,
            handle_in_position: self.handle_in.as_ref().map(|h| h.current),
            handle_out_position: self.handle_out.as_ref().map(|h| h.current),
        }
    }
}

impl SkinnedCurve {
    /// Moves every bound point to follow the skeleton's current pose and
    /// refreshes the curve confidence.
    #[allow(clippy::cast_precision_loss)]
    pub fn deform(&mut self, skeleton: &Skeleton) {
        let mut total = 0.0;
        for segment in &mut self.segments {
            segment.deform(skeleton);
            total += segment.point.confidence(skeleton);
        }
        let count = self.segments.len().max(1);
        self.confidence = total / count as f64;
    }

    /// Produces the renderable curve from the last deformed positions.
    #[must_use]
    pub fn evaluate(&self, min_confidence: f64) -> EvaluatedCurve {
        EvaluatedCurve {
            name: self.name.clone(),
            points: self.segments.iter().map(SkinnedSegment::evaluate).collect(),
            style: self.style,
            closed: self.closed,
            confidence: self.confidence,
            suppressed: self.confidence < min_confidence,
        }
    }
}
