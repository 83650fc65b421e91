use super::{Point2, TOLERANCE};

/// Projection of a point onto a line segment, clamped to the segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// The closest point on the segment.
    pub point: Point2,
    /// Parameter of `point` along the segment, in `[0, 1]`.
    pub t: f64,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

/// Finds the point on segment `a → b` closest to `p`.
///
/// The projection parameter is clamped to `[0, 1]`, so the result never lies
/// beyond either endpoint. A zero-length segment projects onto `a`.
#[must_use]
pub fn closest_point_on_segment(a: &Point2, b: &Point2, p: &Point2) -> SegmentProjection {
    let d = b - a;
    let len_sq = d.norm_squared();

    let t = if len_sq < TOLERANCE * TOLERANCE {
        0.0
    } else {
        ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0)
    };

    let point = a + d * t;
    SegmentProjection {
        point,
        t,
        distance: nalgebra::distance(&point, p),
    }
}

/// Returns the minimum distance from `p` to the line segment `a → b`.
#[must_use]
pub fn point_to_segment_dist(a: &Point2, b: &Point2, p: &Point2) -> f64 {
    closest_point_on_segment(a, b, p).distance
}
