use super::{Point2, Vector2, TOLERANCE};

/// Returns `v` rotated by +90° (the left-pointing normal for a unit direction).
#[must_use]
pub fn rotate90(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// Checks whether two vectors lie on a common line.
///
/// Returns `true` when the absolute cosine of the angle between `v0` and `v1`
/// exceeds `1 - threshold`. Opposite directions count as collinear. A
/// zero-length vector is never collinear with anything.
#[must_use]
pub fn is_collinear(v0: &Vector2, v1: &Vector2, threshold: f64) -> bool {
    let (l0, l1) = (v0.norm(), v1.norm());
    if l0 < TOLERANCE || l1 < TOLERANCE {
        return false;
    }
    (v0.dot(v1) / (l0 * l1)).abs() > 1.0 - threshold
}

/// A point expressed in the local frame of a reference segment.
///
/// Built from a reference segment `(p0, p1)` and a point `p`, the transform
/// records `p` as an offset along the segment direction and along its normal,
/// both measured from `p0`. [`FrameTransform::apply`] re-expresses that
/// offset relative to a new segment, so `p` follows the segment's
/// translation, rotation and uniform scale.
///
/// ```
/// use marionette::math::{FrameTransform, Point2};
///
/// let f = FrameTransform::new(
///     &Point2::new(0.0, 0.0),
///     &Point2::new(1.0, 0.0),
///     &Point2::new(0.5, 1.0),
/// );
/// // Rotate the segment by 90° and double its length.
/// let q = f.apply(&Point2::new(0.0, 0.0), &Point2::new(0.0, 2.0));
/// assert!((q.x + 2.0).abs() < 1e-12 && (q.y - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTransform {
    /// Offset in the segment's local frame.
    Local {
        /// Offset along the segment direction.
        x: f64,
        /// Offset along the segment normal.
        y: f64,
        /// Reference segment length.
        length: f64,
    },
    /// The reference segment had no length; only translation is tracked.
    Translation(Vector2),
}

impl FrameTransform {
    /// Captures `p` in the frame of the reference segment `p0 → p1`.
    #[must_use]
    pub fn new(p0: &Point2, p1: &Point2, p: &Point2) -> Self {
        let d = p1 - p0;
        let length = d.norm();
        let v = p - p0;
        if length < TOLERANCE {
            return Self::Translation(v);
        }
        let dir = d / length;
        let n = rotate90(&dir);
        Self::Local {
            x: v.dot(&dir),
            y: v.dot(&n),
            length,
        }
    }

    /// Maps the captured point into the frame of the segment `p0 → p1`.
    ///
    /// A zero-length target segment collapses the result onto `p0`.
    #[must_use]
    pub fn apply(&self, p0: &Point2, p1: &Point2) -> Point2 {
        match *self {
            Self::Translation(offset) => p0 + offset,
            Self::Local { x, y, length } => {
                let d = p1 - p0;
                let new_length = d.norm();
                if new_length < TOLERANCE {
                    return *p0;
                }
                let scale = new_length / length;
                let dir = d / new_length;
                let n = rotate90(&dir);
                p0 + dir * (x * scale) + n * (y * scale)
            }
        }
    }
}
