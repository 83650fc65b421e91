use thiserror::Error;

use crate::skeleton::Keypoint;

/// Top-level error type for the marionette rig.
#[derive(Debug, Error)]
pub enum MarionetteError {
    #[error(transparent)]
    Skeleton(#[from] SkeletonError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while building or querying a skeleton.
#[derive(Debug, Error)]
pub enum SkeletonError {
    #[error("rest pose has no position for keypoint `{0}`")]
    MissingKeypoint(Keypoint),

    #[error("unknown keypoint name: {0}")]
    UnknownKeypoint(String),

    #[error("bone not found in skeleton")]
    BoneNotFound,
}

/// Errors raised while binding artwork to a skeleton.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("explicit bone set for curve `{0}` is empty")]
    EmptyBoneSet(String),

    #[error("curve `{0}` references a bone that is not in the skeleton")]
    BoneNotFound(String),

    #[error("curve `{0}` has no segments")]
    EmptyCurve(String),
}

/// Errors raised while decoding detector output.
#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("unknown pose part: {0}")]
    UnknownPart(String),

    #[error("face mesh has {actual} landmarks, at least {expected} are required")]
    MeshTooShort { expected: usize, actual: usize },
}

/// Errors related to rig configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Convenience type alias for results using [`MarionetteError`].
pub type Result<T> = std::result::Result<T, MarionetteError>;
