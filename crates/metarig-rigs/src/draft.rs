//! Draft builder used by variants to assemble a [`RigPlan`].
//!
//! A draft reads the target skeleton through a [`SkeletonView`] and keeps
//! its own bones on the side. Names are made unique against both, so the
//! plan replays without host renames on a fresh target.

use glam::Vec3;
use log::debug;
use metarig_spec::{
    Axis, BBoneShape, BoneName, BoneTransform, ConstraintSpec, LayerMask, Locks, RigType,
    WidgetKind,
};

use crate::error::{SkeletonError, SkeletonResult};
use crate::geometry::{align_axis, orient_along_world};
use crate::plan::{Derivation, DerivedBone, ParentLink, RigPlan};
use crate::skeleton::SkeletonView;

/// In-progress plan for one rig instance.
pub struct RigDraft<'a> {
    view: &'a dyn SkeletonView,
    rig_type: RigType,
    bone: String,
    bones: Vec<DerivedBone>,
    constraints: Vec<ConstraintSpec>,
    parents: Vec<ParentLink>,
    shared: Vec<String>,
}

impl<'a> RigDraft<'a> {
    pub fn new(view: &'a dyn SkeletonView, rig_type: RigType, bone: impl Into<String>) -> Self {
        Self {
            view,
            rig_type,
            bone: bone.into(),
            bones: Vec::new(),
            constraints: Vec::new(),
            parents: Vec::new(),
            shared: Vec::new(),
        }
    }

    pub fn view(&self) -> &'a dyn SkeletonView {
        self.view
    }

    /// True if `name` exists in the skeleton or in this draft.
    pub fn contains(&self, name: &str) -> bool {
        self.view.contains(name) || self.bones.iter().any(|b| b.name == name)
    }

    fn derived(&self, name: &str) -> Option<&DerivedBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    fn derived_mut(&mut self, name: &str) -> SkeletonResult<&mut DerivedBone> {
        self.bones
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| SkeletonError::UnknownBone(name.to_string()))
    }

    /// Current transform of a draft or skeleton bone.
    pub fn transform(&self, name: &str) -> SkeletonResult<BoneTransform> {
        match self.derived(name) {
            Some(bone) => Ok(bone.transform),
            None => self.view.transform(name),
        }
    }

    fn parent_of(&self, name: &str) -> SkeletonResult<Option<String>> {
        match self.derived(name) {
            Some(bone) => Ok(bone.parent.clone()),
            None => self.view.parent(name),
        }
    }

    fn bbone_of(&self, name: &str) -> SkeletonResult<BBoneShape> {
        match self.derived(name) {
            Some(bone) => Ok(bone.bbone),
            None => self.view.bbone(name),
        }
    }

    /// First free rendering of `name`, bumping its ordinal on collision.
    pub fn unique_name(&self, name: &BoneName) -> String {
        let mut candidate = name.clone();
        let mut rendered = candidate.render();
        while self.contains(&rendered) {
            candidate = candidate.bumped();
            rendered = candidate.render();
        }
        rendered
    }

    /// Adds a bone with explicit geometry and returns its unique name.
    pub fn new_bone(
        &mut self,
        name: &BoneName,
        transform: BoneTransform,
        source: &str,
        step: &'static str,
    ) -> String {
        let unique = self.unique_name(name);
        debug!(
            "{} on '{}': {} bone '{}' from '{}'",
            self.rig_type, self.bone, step, unique, source
        );
        self.bones.push(DerivedBone {
            name: unique.clone(),
            role: name.role,
            derivation: Derivation {
                source: source.to_string(),
                step,
            },
            transform,
            parent: None,
            bbone: BBoneShape::default(),
            locks: None,
            widget: None,
            layers: None,
        });
        unique
    }

    /// Copies geometry, parent and bendy settings of `source`.
    pub fn copy_bone(
        &mut self,
        source: &str,
        name: &BoneName,
        step: &'static str,
    ) -> SkeletonResult<String> {
        let transform = self.transform(source)?;
        let parent = self.parent_of(source)?;
        let bbone = self.bbone_of(source)?;
        let unique = self.new_bone(name, transform, source, step);
        let bone = self.derived_mut(&unique)?;
        bone.parent = parent;
        bone.bbone = bbone;
        Ok(unique)
    }

    /// Copies only the geometry of `source`.
    pub fn copy_bone_simple(
        &mut self,
        source: &str,
        name: &BoneName,
        step: &'static str,
    ) -> SkeletonResult<String> {
        let transform = self.transform(source)?;
        Ok(self.new_bone(name, transform, source, step))
    }

    /// Applies `edit` to the transform of a draft bone.
    pub fn edit(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut BoneTransform),
    ) -> SkeletonResult<()> {
        edit(&mut self.derived_mut(name)?.transform);
        Ok(())
    }

    /// Translates a draft bone so its head sits at `head`.
    pub fn put_bone(&mut self, name: &str, head: Vec3) -> SkeletonResult<()> {
        self.edit(name, |t| t.move_head_to(head))
    }

    pub fn set_head(&mut self, name: &str, head: Vec3) -> SkeletonResult<()> {
        self.edit(name, |t| t.head = head)
    }

    pub fn set_tail(&mut self, name: &str, tail: Vec3) -> SkeletonResult<()> {
        self.edit(name, |t| t.tail = tail)
    }

    pub fn set_length(&mut self, name: &str, length: f32) -> SkeletonResult<()> {
        self.edit(name, |t| t.set_length(length))
    }

    pub fn scale_length(&mut self, name: &str, factor: f32) -> SkeletonResult<()> {
        self.edit(name, |t| t.scale_length(factor))
    }

    /// Points a draft bone along a world axis with the given length.
    pub fn orient_along_world(&mut self, name: &str, axis: Axis, length: f32) -> SkeletonResult<()> {
        self.edit(name, |t| orient_along_world(t, axis, length))
    }

    /// Aligns a local axis of a draft bone. Degenerate vectors are ignored.
    pub fn align_axis(&mut self, name: &str, axis: Axis, vector: Vec3) -> SkeletonResult<bool> {
        let mut aligned = false;
        self.edit(name, |t| aligned = align_axis(t, axis, vector))?;
        if !aligned {
            debug!(
                "{} on '{}': could not align {} axis of '{}' to {:?}",
                self.rig_type, self.bone, axis, name, vector
            );
        }
        Ok(aligned)
    }

    /// Rolls a draft bone so its Z axis points along `vector`.
    pub fn align_roll(&mut self, name: &str, vector: Vec3) -> SkeletonResult<bool> {
        self.align_axis(name, Axis::Z, vector)
    }

    /// Gives a draft bone the Y and X axes of `reference`.
    pub fn match_orientation(&mut self, name: &str, reference: &str) -> SkeletonResult<()> {
        let reference = self.transform(reference)?;
        self.align_axis(name, Axis::Y, reference.y_axis())?;
        self.align_axis(name, Axis::X, reference.x_axis())?;
        Ok(())
    }

    pub fn set_bbone(&mut self, name: &str, shape: BBoneShape) -> SkeletonResult<()> {
        self.derived_mut(name)?.bbone = shape;
        Ok(())
    }

    pub fn set_locks(&mut self, name: &str, locks: Locks) -> SkeletonResult<()> {
        self.derived_mut(name)?.locks = Some(locks);
        Ok(())
    }

    pub fn set_widget(&mut self, name: &str, widget: WidgetKind) -> SkeletonResult<()> {
        self.derived_mut(name)?.widget = Some(widget);
        Ok(())
    }

    pub fn set_layers(&mut self, name: &str, layers: LayerMask) -> SkeletonResult<()> {
        self.derived_mut(name)?.layers = Some(layers);
        Ok(())
    }

    /// Queues a constraint. Emission order is queue order.
    pub fn constrain(&mut self, spec: ConstraintSpec) {
        self.constraints.push(spec);
    }

    /// Queues a final parent assignment.
    pub fn parent(&mut self, child: &str, parent: Option<&str>, connected: bool) {
        self.parents.push(ParentLink {
            child: child.to_string(),
            parent: parent.map(str::to_string),
            connected,
            inherit_scale: None,
        });
    }

    /// Queues an unconnected parent assignment that also disables scale inheritance.
    pub fn parent_without_scale(&mut self, child: &str, parent: Option<&str>) {
        self.parents.push(ParentLink {
            child: child.to_string(),
            parent: parent.map(str::to_string),
            connected: false,
            inherit_scale: Some(false),
        });
    }

    /// Records a bone outside the rig tree that this rig depends on.
    pub fn share(&mut self, name: &str) {
        if !self.shared.iter().any(|s| s == name) {
            self.shared.push(name.to_string());
        }
    }

    pub fn finish(self, root: impl Into<String>, guides: Vec<String>) -> RigPlan {
        RigPlan {
            rig_type: self.rig_type,
            bone: self.bone,
            root: root.into(),
            guides,
            shared: self.shared,
            bones: self.bones,
            constraints: self.constraints,
            parents: self.parents,
        }
    }
}
