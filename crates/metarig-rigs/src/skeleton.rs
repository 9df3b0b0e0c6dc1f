//! The skeleton editing interface.
//!
//! Generation never touches host data directly. It reads through
//! [`SkeletonView`] and writes through [`Skeleton`], whose implementor
//! enforces the phase discipline: structural edits (bones, geometry,
//! parenting) only in [`Phase::Topology`], constraint and pose-bone edits
//! only in [`Phase::Binding`].

use metarig_spec::{BBoneShape, BoneTransform, ConstraintSpec, LayerMask, Locks, WidgetKind};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SkeletonError, SkeletonResult};

/// Editing phase of a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Editable representation: bones, geometry and parenting.
    #[default]
    Topology,
    /// Posable representation: constraints, locks, widgets and layers.
    Binding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Topology => write!(f, "topology"),
            Phase::Binding => write!(f, "binding"),
        }
    }
}

/// Checks that `current` is `required`, naming the operation on failure.
pub fn require_phase(
    current: Phase,
    required: Phase,
    operation: &'static str,
    bone: &str,
) -> SkeletonResult<()> {
    if current == required {
        Ok(())
    } else {
        Err(SkeletonError::WrongPhase {
            operation,
            bone: bone.to_string(),
            required,
            current,
        })
    }
}

/// A child edge of a bone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub name: String,
    /// Head is pinned to the parent's tail.
    pub connected: bool,
}

/// Handle to a created constraint: owner bone and position in its stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintHandle {
    pub owner: String,
    pub index: usize,
}

/// Read access to a skeleton. Allowed in every phase.
pub trait SkeletonView {
    /// Returns true if a bone called `name` exists.
    fn contains(&self, name: &str) -> bool;

    /// All bone names in creation order.
    fn bone_names(&self) -> Vec<String>;

    /// Direct children of `name`, in creation order.
    fn children(&self, name: &str) -> SkeletonResult<Vec<ChildRef>>;

    fn parent(&self, name: &str) -> SkeletonResult<Option<String>>;

    fn is_connected(&self, name: &str) -> SkeletonResult<bool>;

    fn transform(&self, name: &str) -> SkeletonResult<BoneTransform>;

    fn bbone(&self, name: &str) -> SkeletonResult<BBoneShape>;

    fn layers(&self, name: &str) -> SkeletonResult<LayerMask>;
}

/// Mutable access to a skeleton.
pub trait Skeleton: SkeletonView {
    fn phase(&self) -> Phase;

    /// Switches the editing phase. Global and synchronous.
    fn switch_phase(&mut self, phase: Phase);

    /// Creates a bone and returns its actual name, which may differ from
    /// `name` if the host renamed it to avoid a collision.
    fn create_bone(&mut self, name: &str, transform: BoneTransform) -> SkeletonResult<String>;

    fn set_transform(&mut self, name: &str, transform: BoneTransform) -> SkeletonResult<()>;

    /// Sets or clears the parent. A connected child's head snaps to the parent's tail.
    fn set_parent(&mut self, name: &str, parent: Option<&str>, connected: bool)
        -> SkeletonResult<()>;

    fn set_bbone(&mut self, name: &str, shape: BBoneShape) -> SkeletonResult<()>;

    fn set_inherit_scale(&mut self, name: &str, inherit: bool) -> SkeletonResult<()>;

    /// Appends a constraint to the owner's stack, setting only the parameters
    /// the host supports for that kind.
    fn create_constraint(&mut self, spec: &ConstraintSpec) -> SkeletonResult<ConstraintHandle>;

    fn set_locks(&mut self, name: &str, locks: Locks) -> SkeletonResult<()>;

    fn set_widget(&mut self, name: &str, widget: WidgetKind) -> SkeletonResult<()>;

    fn set_layers(&mut self, name: &str, layers: LayerMask) -> SkeletonResult<()>;
}
