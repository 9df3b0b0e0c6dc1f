//! Rig plans: everything a variant wants done, as data.
//!
//! A variant never mutates the skeleton. It returns a [`RigPlan`] listing the
//! bones to create, the constraints to emit and the final parent links. The
//! orchestrator then replays the plan through the phase-correct calls.

use metarig_spec::{
    BBoneShape, BoneTransform, ConstraintSpec, LayerMask, Locks, RigType, RoleTag, WidgetKind,
};
use serde::Serialize;

/// Which guide and which variant step produced a derived bone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Derivation {
    /// Bone the geometry was copied from.
    pub source: String,
    /// Variant step, e.g. "mechanism" or "tweak".
    pub step: &'static str,
}

/// A bone to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedBone {
    pub name: String,
    pub role: RoleTag,
    pub derivation: Derivation,
    pub transform: BoneTransform,
    /// Parent set at creation. Copies inherit their source's parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub bbone: BBoneShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locks: Option<Locks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<LayerMask>,
}

/// A final parent assignment, applied after binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentLink {
    pub child: String,
    pub parent: Option<String>,
    pub connected: bool,
    /// `Some` also sets the child's scale inheritance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_scale: Option<bool>,
}

/// The complete output of one variant's planning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigPlan {
    pub rig_type: RigType,
    /// Guide bone the rig is assigned to.
    pub bone: String,
    /// Designated root of the rig's bone tree.
    pub root: String,
    /// ORG bones of the guides this rig owns.
    pub guides: Vec<String>,
    /// Bones outside the rig tree that this rig parents into, such as a
    /// convergence tweak shared with other rigs.
    pub shared: Vec<String>,
    pub bones: Vec<DerivedBone>,
    pub constraints: Vec<ConstraintSpec>,
    pub parents: Vec<ParentLink>,
}

impl RigPlan {
    pub fn bone(&self, name: &str) -> Option<&DerivedBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Role of a bone in this plan: derived bones by tag, guides as organizational.
    pub fn role_of(&self, name: &str) -> Option<RoleTag> {
        if let Some(bone) = self.bone(name) {
            Some(bone.role)
        } else if self.guides.iter().any(|g| g == name) {
            Some(RoleTag::Organizational)
        } else {
            None
        }
    }

    /// Number of derived bones with `role`.
    pub fn count(&self, role: RoleTag) -> usize {
        self.bones.iter().filter(|b| b.role == role).count()
    }

    /// Names of derived bones with `role`, in creation order.
    pub fn names(&self, role: RoleTag) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|b| b.role == role)
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Constraints owned by `owner`, in emission order.
    pub fn constraints_on(&self, owner: &str) -> Vec<&ConstraintSpec> {
        self.constraints.iter().filter(|c| c.owner == owner).collect()
    }

    /// Parent a bone ends up with: the last link naming it, else its creation parent.
    pub fn final_parent(&self, name: &str) -> Option<&str> {
        if let Some(link) = self.parents.iter().rev().find(|l| l.child == name) {
            return link.parent.as_deref();
        }
        self.bone(name).and_then(|b| b.parent.as_deref())
    }
}
