pub mod artwork;
pub mod config;
pub mod error;
pub mod math;
pub mod observation;
pub mod puppet;
pub mod skeleton;
pub mod skinning;

pub use artwork::{ArtworkGroup, ArtworkItem, SourceCurve, SourceSegment, Style};
pub use config::RigConfig;
pub use error::{MarionetteError, Result};
pub use observation::{FaceObservation, PoseClip, PoseFrame, PoseKeypoint, PoseObservation};
pub use puppet::Puppet;
pub use skeleton::{Keypoint, RestPose, Skeleton};
pub use skinning::{EvaluatedCurve, EvaluatedPoint};
