//! Error types for guide validation and data-model processing.

use std::fmt;

use thiserror::Error;

use crate::params::RigType;

/// Result type for structural guide validation.
pub type GuideResult<T> = Result<T, GuideError>;

/// Result type for data-model operations (parsing, hashing).
pub type SpecResult<T> = Result<T, SpecError>;

/// How many guide bones a rig variant accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneCountRule {
    /// Exactly `n` guide bones.
    Exactly(usize),
    /// At least `n` guide bones.
    AtLeast(usize),
    /// A single guide bone, or at least `n` of them.
    OneOrAtLeast(usize),
}

impl BoneCountRule {
    /// Returns true if `count` satisfies the rule.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            BoneCountRule::Exactly(n) => count == n,
            BoneCountRule::AtLeast(n) => count >= n,
            BoneCountRule::OneOrAtLeast(n) => count == 1 || count >= n,
        }
    }
}

impl fmt::Display for BoneCountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoneCountRule::Exactly(n) => write!(f, "exactly {}", n),
            BoneCountRule::AtLeast(n) => write!(f, "at least {}", n),
            BoneCountRule::OneOrAtLeast(n) => write!(f, "1 or at least {}", n),
        }
    }
}

/// Structural guide errors, raised before any skeleton mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuideError {
    /// G001: The guide chain has the wrong number of bones.
    #[error("{rig_type} on '{bone}' expects {expected} guide bones, found {actual}")]
    BoneCount {
        bone: String,
        rig_type: RigType,
        expected: BoneCountRule,
        actual: usize,
    },

    /// G002: A parameter names a guide bone that does not exist.
    #[error("{rig_type} on '{bone}': {role} bone '{missing}' not found in metarig")]
    MissingGuide {
        bone: String,
        rig_type: RigType,
        role: &'static str,
        missing: String,
    },

    /// G003: The rig assignment points at a bone that does not exist.
    #[error("rig assignment references unknown bone '{bone}'")]
    UnknownRigBone { bone: String },

    /// G004: A parameter is outside its valid range.
    #[error("invalid parameter '{param}' on '{bone}': {message}")]
    InvalidParameter {
        bone: String,
        param: &'static str,
        message: String,
    },

    /// G005: A named guide does not match the chain found in the metarig.
    #[error("{rig_type} on '{bone}': expected {role} bone '{expected}', chain has '{actual}'")]
    UnexpectedGuide {
        bone: String,
        rig_type: RigType,
        role: &'static str,
        expected: String,
        actual: String,
    },
}

impl GuideError {
    /// Returns the stable error code (e.g., "G001").
    pub fn code(&self) -> &'static str {
        match self {
            GuideError::BoneCount { .. } => "G001",
            GuideError::MissingGuide { .. } => "G002",
            GuideError::UnknownRigBone { .. } => "G003",
            GuideError::InvalidParameter { .. } => "G004",
            GuideError::UnexpectedGuide { .. } => "G005",
        }
    }

    /// The guide bone the offending rig is assigned to.
    pub fn bone(&self) -> &str {
        match self {
            GuideError::BoneCount { bone, .. }
            | GuideError::MissingGuide { bone, .. }
            | GuideError::UnknownRigBone { bone }
            | GuideError::InvalidParameter { bone, .. }
            | GuideError::UnexpectedGuide { bone, .. } => bone,
        }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(
        bone: impl Into<String>,
        param: &'static str,
        message: impl Into<String>,
    ) -> Self {
        GuideError::InvalidParameter {
            bone: bone.into(),
            param,
            message: message.into(),
        }
    }
}

/// Errors from data-model parsing and hashing.
#[derive(Debug, Error)]
pub enum SpecError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A guide failed structural validation.
    #[error(transparent)]
    Guide(#[from] GuideError),
}
