//! Error types for skeleton editing and rig generation.

use metarig_spec::{GuideError, RigType};
use thiserror::Error;

use crate::skeleton::Phase;

/// Result type for skeleton editing operations.
pub type SkeletonResult<T> = Result<T, SkeletonError>;

/// Result type for rig generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors raised by a skeleton host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeletonError {
    /// S001: No bone with this name.
    #[error("bone '{0}' not found")]
    UnknownBone(String),

    /// S002: Operation not allowed in the current phase.
    #[error("{operation} on '{bone}' requires {required} phase, skeleton is in {current} phase")]
    WrongPhase {
        operation: &'static str,
        bone: String,
        required: Phase,
        current: Phase,
    },

    /// S003: Parenting would create a cycle.
    #[error("parenting '{bone}' to '{parent}' would create a cycle")]
    ParentCycle { bone: String, parent: String },

    /// S004: A bone with this name already exists.
    #[error("bone '{0}' already exists")]
    DuplicateBone(String),

    /// S005: A bone names a parent that does not exist.
    #[error("bone '{bone}' has unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },
}

impl SkeletonError {
    /// Returns the stable error code (e.g., "S001").
    pub fn code(&self) -> &'static str {
        match self {
            SkeletonError::UnknownBone(_) => "S001",
            SkeletonError::WrongPhase { .. } => "S002",
            SkeletonError::ParentCycle { .. } => "S003",
            SkeletonError::DuplicateBone(_) => "S004",
            SkeletonError::UnknownParent { .. } => "S005",
        }
    }
}

/// Errors loading an armature or metarig document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// L001: The document is not valid JSON for this type.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// The bones do not form a valid hierarchy.
    #[error(transparent)]
    Skeleton(#[from] SkeletonError),
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Json(_) => "L001",
            LoadError::Skeleton(e) => e.code(),
        }
    }
}

/// Errors from a generation pass.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The guide configuration is structurally invalid. Raised before any mutation.
    #[error(transparent)]
    Guide(#[from] GuideError),

    /// The host failed part-way through a rig. Bones created so far remain.
    #[error("generating {rig_type} on '{bone}' failed: {source}")]
    Skeleton {
        bone: String,
        rig_type: RigType,
        #[source]
        source: SkeletonError,
    },

    /// The host failed outside any single rig (metarig ingestion).
    #[error(transparent)]
    Host(#[from] SkeletonError),
}

impl GenerationError {
    /// Creates a mid-generation failure for one rig instance.
    pub fn in_rig(bone: impl Into<String>, rig_type: RigType, source: SkeletonError) -> Self {
        GenerationError::Skeleton {
            bone: bone.into(),
            rig_type,
            source,
        }
    }

    /// Returns the stable error code of the underlying error.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Guide(e) => e.code(),
            GenerationError::Skeleton { source, .. } | GenerationError::Host(source) => {
                source.code()
            }
        }
    }

    /// True if the error was raised before the skeleton was touched.
    pub fn is_structural(&self) -> bool {
        matches!(self, GenerationError::Guide(_))
    }
}
