pub mod distance_2d;
pub mod frame_2d;

pub use distance_2d::{closest_point_on_segment, point_to_segment_dist, SegmentProjection};
pub use frame_2d::{is_collinear, rotate90, FrameTransform};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Linearly interpolates between `a` and `b` at parameter `t`.
#[must_use]
pub fn lerp(a: &Point2, b: &Point2, t: f64) -> Point2 {
    a + (b - a) * t
}
