use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BoneKind, Keypoint};

use super::keypoint::Keypoint::{
    JawMid, LeftAnkle, LeftBrow0, LeftBrow1, LeftBrow2, LeftBrow3, LeftBrow4, LeftElbow, LeftEye0,
    LeftEye1, LeftEye2, LeftEye3, LeftEye4, LeftEye5, LeftHip, LeftJaw2, LeftJaw3, LeftJaw4,
    LeftJaw5, LeftJaw6, LeftJaw7, LeftKnee, LeftLowerLipBottom0, LeftLowerLipBottom1,
    LeftLowerLipTop0, LeftMiddleLip, LeftMouthCorner, LeftNose0, LeftNose1, LeftShoulder, LeftTop0,
    LeftTop1, LeftUpperLipBottom1, LeftUpperLipTop0, LeftUpperLipTop1, LeftWrist,
    LowerLipBottomMid, LowerLipTopMid, Nose0, Nose1, Nose2, Nose3, Nose4, RightAnkle, RightBrow0,
    RightBrow1, RightBrow2, RightBrow3, RightBrow4, RightElbow, RightEye0, RightEye1, RightEye2,
    RightEye3, RightEye4, RightEye5, RightHip, RightJaw2, RightJaw3, RightJaw4, RightJaw5,
    RightJaw6, RightJaw7, RightKnee, RightLowerLipBottom0, RightLowerLipBottom1,
    RightLowerLipTop0, RightMiddleLip, RightMouthCorner, RightNose0, RightNose1, RightShoulder,
    RightTop0, RightTop1, RightUpperLipBottom1, RightUpperLipTop0, RightUpperLipTop1, RightWrist,
    TopMid, UpperLipBottomMid, UpperLipTopMid,
};

/// Keypoint whose current position anchors secondary bones.
pub const NOSE: Keypoint = Nose4;

/// Face keypoints that define the frame face landmarks are inferred in when
/// face tracking is lost.
pub const FACE_FRAME: (Keypoint, Keypoint) = (LeftJaw2, RightJaw2);

const TORSO: &[(Keypoint, Keypoint)] = &[
    (LeftShoulder, RightShoulder),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    (LeftShoulder, LeftHip),
];

const LEFT_ARM: &[(Keypoint, Keypoint)] = &[(LeftShoulder, LeftElbow), (LeftElbow, LeftWrist)];

const RIGHT_ARM: &[(Keypoint, Keypoint)] =
    &[(RightShoulder, RightElbow), (RightElbow, RightWrist)];

const LEFT_LEG: &[(Keypoint, Keypoint)] = &[(LeftHip, LeftKnee), (LeftKnee, LeftAnkle)];

const RIGHT_LEG: &[(Keypoint, Keypoint)] = &[(RightHip, RightKnee), (RightKnee, RightAnkle)];

const FACE: &[(Keypoint, Keypoint)] = &[
    // Outline
    (TopMid, RightTop0),
    (RightTop0, RightTop1),
    (TopMid, LeftTop0),
    (LeftTop0, LeftTop1),
    (LeftTop1, LeftJaw2),
    (LeftJaw2, LeftJaw3),
    (LeftJaw3, LeftJaw4),
    (LeftJaw4, LeftJaw5),
    (LeftJaw5, LeftJaw6),
    (LeftJaw6, LeftJaw7),
    (LeftJaw7, JawMid),
    (RightTop1, RightJaw2),
    (RightJaw2, RightJaw3),
    (RightJaw3, RightJaw4),
    (RightJaw4, RightJaw5),
    (RightJaw5, RightJaw6),
    (RightJaw6, RightJaw7),
    (RightJaw7, JawMid),
    // Eyes
    (LeftEye0, LeftEye1),
    (LeftEye1, LeftEye2),
    (LeftEye2, LeftEye3),
    (LeftEye3, LeftEye4),
    (LeftEye4, LeftEye5),
    (LeftEye5, LeftEye0),
    (RightEye0, RightEye1),
    (RightEye1, RightEye2),
    (RightEye2, RightEye3),
    (RightEye3, RightEye4),
    (RightEye4, RightEye5),
    (RightEye5, RightEye0),
    // Brows
    (LeftBrow0, LeftBrow1),
    (LeftBrow1, LeftBrow2),
    (LeftBrow2, LeftBrow3),
    (LeftBrow3, LeftBrow4),
    (RightBrow0, RightBrow1),
    (RightBrow1, RightBrow2),
    (RightBrow2, RightBrow3),
    (RightBrow3, RightBrow4),
    // Nose
    (Nose0, Nose1),
    (Nose1, Nose2),
    (Nose2, Nose3),
    (Nose3, Nose4),
    (LeftNose0, LeftNose1),
    (LeftNose1, Nose4),
    (RightNose0, RightNose1),
    (RightNose1, Nose4),
    // Upper lip
    (LeftMouthCorner, LeftUpperLipTop0),
    (LeftUpperLipTop0, LeftUpperLipTop1),
    (LeftUpperLipTop1, UpperLipTopMid),
    (RightMouthCorner, RightUpperLipTop0),
    (RightUpperLipTop0, RightUpperLipTop1),
    (RightUpperLipTop1, UpperLipTopMid),
    (LeftMouthCorner, LeftMiddleLip),
    (LeftMiddleLip, LeftUpperLipBottom1),
    (LeftUpperLipBottom1, UpperLipBottomMid),
    (RightMouthCorner, RightMiddleLip),
    (RightMiddleLip, RightUpperLipBottom1),
    (RightUpperLipBottom1, UpperLipBottomMid),
    // Lower lip
    (LeftMiddleLip, LeftLowerLipTop0),
    (LeftLowerLipTop0, LowerLipTopMid),
    (RightMiddleLip, RightLowerLipTop0),
    (RightLowerLipTop0, LowerLipTopMid),
    (LeftMouthCorner, LeftLowerLipBottom0),
    (LeftLowerLipBottom0, LeftLowerLipBottom1),
    (LeftLowerLipBottom1, LowerLipBottomMid),
    (RightMouthCorner, RightLowerLipBottom0),
    (RightLowerLipBottom0, RightLowerLipBottom1),
    (RightLowerLipBottom1, LowerLipBottomMid),
];

/// A named region of primary bones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoneGroup {
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Face,
}

impl BoneGroup {
    /// Every group, in skeleton construction order.
    pub const ALL: [BoneGroup; 6] = [
        BoneGroup::Torso,
        BoneGroup::LeftArm,
        BoneGroup::RightArm,
        BoneGroup::LeftLeg,
        BoneGroup::RightLeg,
        BoneGroup::Face,
    ];

    /// Keypoint pairs of the bones in this group.
    #[must_use]
    pub fn members(self) -> &'static [(Keypoint, Keypoint)] {
        match self {
            Self::Torso => TORSO,
            Self::LeftArm => LEFT_ARM,
            Self::RightArm => RIGHT_ARM,
            Self::LeftLeg => LEFT_LEG,
            Self::RightLeg => RIGHT_LEG,
            Self::Face => FACE,
        }
    }

    /// Kind shared by every bone in this group.
    #[must_use]
    pub fn kind(self) -> BoneKind {
        match self {
            Self::Face => BoneKind::Face,
            _ => BoneKind::Body,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Torso => "torso",
            Self::LeftArm => "leftArm",
            Self::RightArm => "rightArm",
            Self::LeftLeg => "leftLeg",
            Self::RightLeg => "rightLeg",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for BoneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
