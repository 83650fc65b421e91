use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SkeletonError;

/// Declares the keypoint enum together with its name and face-mesh tables,
/// so the three can never drift apart.
macro_rules! keypoints {
    (
        pose { $($pv:ident => $pn:literal),* $(,)? }
        face { $($fv:ident => $fname:literal @ $fm:literal),* $(,)? }
    ) => {
        /// A named anatomical or facial landmark.
        ///
        /// Pose parts come first, followed by face parts in the order face
        /// observations list their landmarks.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Keypoint {
            $($pv,)*
            $($fv,)*
        }

        impl Keypoint {
            /// Body keypoints reported by the pose detector.
            pub const POSE: &'static [Keypoint] = &[$(Keypoint::$pv),*];

            /// Facial landmarks, in face observation order.
            pub const FACE: &'static [Keypoint] = &[$(Keypoint::$fv),*];

            /// Every keypoint, indexed by [`Keypoint::index`].
            pub const ALL: &'static [Keypoint] = &[$(Keypoint::$pv,)* $(Keypoint::$fv),*];

            /// Total number of keypoints.
            pub const COUNT: usize = Self::ALL.len();

            /// Returns the detector-facing name of this keypoint.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$pv => $pn,)*
                    $(Self::$fv => $fname,)*
                }
            }

            /// Returns the vertex index of this landmark in the full face mesh.
            ///
            /// Pose keypoints have no mesh index.
            #[must_use]
            pub fn mesh_index(self) -> Option<usize> {
                match self {
                    $(Self::$pv => None,)*
                    $(Self::$fv => Some($fm),)*
                }
            }
        }

        impl FromStr for Keypoint {
            type Err = SkeletonError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($pn => Ok(Self::$pv),)*
                    $($fname => Ok(Self::$fv),)*
                    _ => Err(SkeletonError::UnknownKeypoint(s.to_owned())),
                }
            }
        }
    };
}

keypoints! {
    pose {
        LeftAnkle => "leftAnkle",
        LeftKnee => "leftKnee",
        LeftHip => "leftHip",
        LeftWrist => "leftWrist",
        LeftElbow => "leftElbow",
        LeftShoulder => "leftShoulder",
        RightAnkle => "rightAnkle",
        RightKnee => "rightKnee",
        RightHip => "rightHip",
        RightWrist => "rightWrist",
        RightElbow => "rightElbow",
        RightShoulder => "rightShoulder",
        LeftEar => "leftEar",
        RightEar => "rightEar",
    }
    face {
        TopMid => "topMid" @ 10,
        RightTop0 => "rightTop0" @ 67,
        RightTop1 => "rightTop1" @ 54,
        LeftTop0 => "leftTop0" @ 297,
        LeftTop1 => "leftTop1" @ 284,
        RightJaw0 => "rightJaw0" @ 21,
        RightJaw1 => "rightJaw1" @ 162,
        RightJaw2 => "rightJaw2" @ 127,
        RightJaw3 => "rightJaw3" @ 234,
        RightJaw4 => "rightJaw4" @ 132,
        RightJaw5 => "rightJaw5" @ 172,
        RightJaw6 => "rightJaw6" @ 150,
        RightJaw7 => "rightJaw7" @ 176,
        JawMid => "jawMid" @ 152,
        LeftJaw7 => "leftJaw7" @ 400,
        LeftJaw6 => "leftJaw6" @ 379,
        LeftJaw5 => "leftJaw5" @ 397,
        LeftJaw4 => "leftJaw4" @ 361,
        LeftJaw3 => "leftJaw3" @ 454,
        LeftJaw2 => "leftJaw2" @ 356,
        LeftJaw1 => "leftJaw1" @ 389,
        LeftJaw0 => "leftJaw0" @ 251,
        RightBrow0 => "rightBrow0" @ 46,
        RightBrow1 => "rightBrow1" @ 53,
        RightBrow2 => "rightBrow2" @ 52,
        RightBrow3 => "rightBrow3" @ 65,
        RightBrow4 => "rightBrow4" @ 55,
        LeftBrow4 => "leftBrow4" @ 285,
        LeftBrow3 => "leftBrow3" @ 295,
        LeftBrow2 => "leftBrow2" @ 282,
        LeftBrow1 => "leftBrow1" @ 283,
        LeftBrow0 => "leftBrow0" @ 276,
        Nose0 => "nose0" @ 6,
        Nose1 => "nose1" @ 197,
        Nose2 => "nose2" @ 195,
        Nose3 => "nose3" @ 5,
        RightNose0 => "rightNose0" @ 48,
        RightNose1 => "rightNose1" @ 220,
        Nose4 => "nose4" @ 4,
        LeftNose1 => "leftNose1" @ 440,
        LeftNose0 => "leftNose0" @ 278,
        RightEye0 => "rightEye0" @ 33,
        RightEye1 => "rightEye1" @ 160,
        RightEye2 => "rightEye2" @ 158,
        RightEye3 => "rightEye3" @ 133,
        RightEye4 => "rightEye4" @ 153,
        RightEye5 => "rightEye5" @ 144,
        LeftEye3 => "leftEye3" @ 362,
        LeftEye2 => "leftEye2" @ 385,
        LeftEye1 => "leftEye1" @ 387,
        LeftEye0 => "leftEye0" @ 263,
        LeftEye5 => "leftEye5" @ 373,
        LeftEye4 => "leftEye4" @ 380,
        RightMouthCorner => "rightMouthCorner" @ 61,
        RightUpperLipTop0 => "rightUpperLipTop0" @ 40,
        RightUpperLipTop1 => "rightUpperLipTop1" @ 37,
        UpperLipTopMid => "upperLipTopMid" @ 0,
        LeftUpperLipTop1 => "leftUpperLipTop1" @ 267,
        LeftUpperLipTop0 => "leftUpperLipTop0" @ 270,
        LeftMouthCorner => "leftMouthCorner" @ 291,
        LeftLowerLipBottom0 => "leftLowerLipBottom0" @ 321,
        LeftLowerLipBottom1 => "leftLowerLipBottom1" @ 314,
        LowerLipBottomMid => "lowerLipBottomMid" @ 17,
        RightLowerLipBottom1 => "rightLowerLipBottom1" @ 84,
        RightLowerLipBottom0 => "rightLowerLipBottom0" @ 91,
        RightMiddleLip => "rightMiddleLip" @ 78,
        RightUpperLipBottom1 => "rightUpperLipBottom1" @ 81,
        UpperLipBottomMid => "upperLipBottomMid" @ 13,
        LeftUpperLipBottom1 => "leftUpperLipBottom1" @ 311,
        LeftMiddleLip => "leftMiddleLip" @ 308,
        LeftLowerLipTop0 => "leftLowerLipTop0" @ 402,
        LowerLipTopMid => "lowerLipTopMid" @ 14,
        RightLowerLipTop0 => "rightLowerLipTop0" @ 178,
    }
}

impl Keypoint {
    /// Position of this keypoint in [`Keypoint::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for facial landmarks.
    #[must_use]
    pub fn is_face(self) -> bool {
        self.index() >= Self::POSE.len()
    }

    /// Position of this landmark within a face observation, if it is one.
    #[must_use]
    pub fn face_index(self) -> Option<usize> {
        self.index().checked_sub(Self::POSE.len())
    }

    /// Returns the keypoint on the opposite side of the body.
    ///
    /// Midline keypoints such as `jawMid` map to themselves.
    #[must_use]
    pub fn mirrored(self) -> Self {
        let name = self.name();
        let swapped = if let Some(rest) = name.strip_prefix("left") {
            format!("right{rest}")
        } else if let Some(rest) = name.strip_prefix("right") {
            format!("left{rest}")
        } else {
            return self;
        };
        swapped.parse().unwrap_or(self)
    }
}

impl fmt::Display for Keypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Keypoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Keypoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(Keypoint::POSE.len(), 14);
        assert_eq!(Keypoint::FACE.len(), 73);
        assert_eq!(Keypoint::COUNT, 87);
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, kp) in Keypoint::ALL.iter().enumerate() {
            assert_eq!(kp.index(), i, "{kp}");
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for kp in Keypoint::ALL {
            assert_eq!(kp.name().parse::<Keypoint>().unwrap(), *kp);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "tail".parse::<Keypoint>().unwrap_err();
        assert!(matches!(err, SkeletonError::UnknownKeypoint(ref n) if n == "tail"));
    }

    #[test]
    fn face_indices_follow_face_order() {
        assert_eq!(Keypoint::TopMid.face_index(), Some(0));
        assert_eq!(Keypoint::JawMid.face_index(), Some(13));
        assert_eq!(Keypoint::LeftEar.face_index(), None);
        assert!(Keypoint::Nose4.is_face());
        assert!(!Keypoint::RightHip.is_face());
    }

    #[test]
    fn mesh_indices() {
        assert_eq!(Keypoint::TopMid.mesh_index(), Some(10));
        assert_eq!(Keypoint::LeftEye0.mesh_index(), Some(263));
        assert_eq!(Keypoint::LeftAnkle.mesh_index(), None);
    }

    #[test]
    fn mirrored_swaps_sides() {
        assert_eq!(Keypoint::LeftEar.mirrored(), Keypoint::RightEar);
        assert_eq!(Keypoint::RightUpperLipTop1.mirrored(), Keypoint::LeftUpperLipTop1);
        assert_eq!(Keypoint::JawMid.mirrored(), Keypoint::JawMid);
        for kp in Keypoint::ALL {
            assert_eq!(kp.mirrored().mirrored(), *kp);
        }
    }
}
