//! Input artwork: Bézier curves and keypoint-marked groups to bind.

use serde::{Deserialize, Serialize};

use crate::math::{Point2, Vector2};
use crate::skeleton::Keypoint;

/// An RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    #[must_use]
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Paint attributes carried from bind time to every evaluated frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

/// One anchor of a cubic Bézier curve.
///
/// Handles are offsets from `point`, not absolute positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSegment {
    pub point: Point2,
    #[serde(default)]
    pub handle_in: Option<Vector2>,
    #[serde(default)]
    pub handle_out: Option<Vector2>,
}

impl SourceSegment {
    /// A corner segment with no handles.
    #[must_use]
    pub fn corner(point: Point2) -> Self {
        Self {
            point,
            handle_in: None,
            handle_out: None,
        }
    }

    /// A segment with both handles.
    #[must_use]
    pub fn smooth(point: Point2, handle_in: Vector2, handle_out: Vector2) -> Self {
        Self {
            point,
            handle_in: Some(handle_in),
            handle_out: Some(handle_out),
        }
    }
}

/// A curve as drawn in the rest pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCurve {
    pub name: String,
    pub segments: Vec<SourceSegment>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub closed: bool,
    /// Primary bones to bind to, by keypoint pair. `None` picks the nearest
    /// bone group for every segment.
    #[serde(default)]
    pub bones: Option<Vec<(Keypoint, Keypoint)>>,
}

impl SourceCurve {
    #[must_use]
    pub fn new(name: impl Into<String>, segments: Vec<SourceSegment>) -> Self {
        Self {
            name: name.into(),
            segments,
            style: Style::default(),
            closed: false,
            bones: None,
        }
    }

    /// An open polyline through `points`.
    #[must_use]
    pub fn polyline(name: impl Into<String>, points: &[Point2]) -> Self {
        Self::new(name, points.iter().copied().map(SourceSegment::corner).collect())
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Binds this curve only to the primary bones between the given
    /// keypoint pairs.
    #[must_use]
    pub fn with_bones(mut self, bones: Vec<(Keypoint, Keypoint)>) -> Self {
        self.bones = Some(bones);
        self
    }
}

/// A keypoint position drawn inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub keypoint: Keypoint,
    pub position: Point2,
}

/// Curves that follow their own copies of skeleton bones.
///
/// Every primary bone whose two keypoints both appear among `markers` gets a
/// secondary bone between the marker positions, and the group's curves bind
/// to those secondary bones only. This lets e.g. glasses or a hat keep
/// their own proportions while following the face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtworkGroup {
    pub name: String,
    pub markers: Vec<Marker>,
    pub curves: Vec<SourceCurve>,
}

impl ArtworkGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_marker(mut self, keypoint: Keypoint, position: Point2) -> Self {
        self.markers.push(Marker { keypoint, position });
        self
    }

    #[must_use]
    pub fn with_curve(mut self, curve: SourceCurve) -> Self {
        self.curves.push(curve);
        self
    }

    /// Position of the marker for `keypoint`; the first one wins.
    #[must_use]
    pub fn marker(&self, keypoint: Keypoint) -> Option<Point2> {
        self.markers
            .iter()
            .find(|m| m.keypoint == keypoint)
            .map(|m| m.position)
    }
}

/// A top-level artwork element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtworkItem {
    Curve(SourceCurve),
    Group(ArtworkGroup),
}

impl From<SourceCurve> for ArtworkItem {
    fn from(curve: SourceCurve) -> Self {
        Self::Curve(curve)
    }
}

impl From<ArtworkGroup> for ArtworkItem {
    fn from(group: ArtworkGroup) -> Self {
        Self::Group(group)
    }
}
