//! In-memory skeleton host.
//!
//! [`Armature`] implements the skeleton editing interface over a flat list of
//! bone records. It enforces phases, renames colliding bones, refuses parent
//! cycles and keeps a journal of every mutating call so callers can check
//! what a generation pass actually did.

use glam::{Mat4, Vec3};
use log::debug;
use metarig_spec::hash::canonical_hash;
use metarig_spec::{
    BBoneShape, BoneName, BoneTransform, ConstraintKind, ConstraintParam, ConstraintSpec,
    LayerMask, Locks, ParamValue, SpecResult, WidgetKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{LoadError, SkeletonError, SkeletonResult};
use crate::skeleton::{require_phase, ChildRef, ConstraintHandle, Phase, Skeleton, SkeletonView};

fn default_true() -> bool {
    true
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

fn is_identity(m: &Mat4) -> bool {
    *m == Mat4::IDENTITY
}

fn is_free(locks: &Locks) -> bool {
    *locks == Locks::free()
}

fn is_true(b: &bool) -> bool {
    *b
}

/// One bone of an [`Armature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    pub name: String,
    #[serde(flatten)]
    pub transform: BoneTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub inherit_scale: bool,
    #[serde(default, skip_serializing_if = "BBoneShape::is_default")]
    pub bbone: BBoneShape,
    #[serde(default)]
    pub layers: LayerMask,
    #[serde(default, skip_serializing_if = "is_free")]
    pub locks: Locks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintRecord>,
    /// Local pose transform relative to the rest pose.
    #[serde(default = "identity", skip_serializing_if = "is_identity")]
    pub pose: Mat4,
}

impl BoneRecord {
    /// Creates an unparented bone with zero roll.
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self::from_transform(name, BoneTransform::new(head, tail))
    }

    pub fn from_transform(name: impl Into<String>, transform: BoneTransform) -> Self {
        Self {
            name: name.into(),
            transform,
            parent: None,
            connected: false,
            inherit_scale: true,
            bbone: BBoneShape::default(),
            layers: LayerMask::default(),
            locks: Locks::free(),
            widget: None,
            constraints: Vec::new(),
            pose: Mat4::IDENTITY,
        }
    }

    pub fn roll(mut self, roll: f32) -> Self {
        self.transform.roll = roll;
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Marks the bone as connected to its parent.
    pub fn connected(mut self) -> Self {
        self.connected = true;
        self
    }

    pub fn layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }
}

/// A constraint as stored by the host: kind plus the parameters it accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<ConstraintParam, ParamValue>,
}

impl ConstraintRecord {
    pub fn get(&self, param: ConstraintParam) -> Option<&ParamValue> {
        self.params.get(&param)
    }

    /// The target bone, if the kind has one.
    pub fn target(&self) -> Option<&str> {
        match self.params.get(&ConstraintParam::Subtarget) {
            Some(ParamValue::Bone(name)) => Some(name),
            _ => None,
        }
    }

    pub fn influence(&self) -> Option<f32> {
        match self.params.get(&ConstraintParam::Influence) {
            Some(ParamValue::Float(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Parameters this host can set on each constraint kind.
pub fn supported_params(kind: &ConstraintKind) -> &'static [ConstraintParam] {
    use ConstraintParam as P;
    match kind {
        ConstraintKind::StretchTo { .. } => &[P::Subtarget, P::Influence],
        ConstraintKind::CopyScale { .. } => &[
            P::Subtarget,
            P::UseX,
            P::UseY,
            P::UseZ,
            P::Influence,
            P::OwnerSpace,
            P::TargetSpace,
        ],
        ConstraintKind::CopyRotation { .. } => &[
            P::Subtarget,
            P::UseX,
            P::UseY,
            P::UseZ,
            P::UseOffset,
            P::Influence,
            P::OwnerSpace,
            P::TargetSpace,
        ],
        ConstraintKind::CopyLocation { .. } | ConstraintKind::CopyTransforms { .. } => &[
            P::Subtarget,
            P::Influence,
            P::OwnerSpace,
            P::TargetSpace,
        ],
        ConstraintKind::LimitRotation { .. } => &[
            P::UseLimitX,
            P::UseLimitY,
            P::UseLimitZ,
            P::MinX,
            P::MaxX,
            P::MinY,
            P::MaxY,
            P::MinZ,
            P::MaxZ,
            P::Influence,
            P::OwnerSpace,
        ],
        ConstraintKind::BendyHandles { .. } => &[P::HandleStart, P::HandleEnd],
    }
}

/// A mutating call recorded by the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonOp {
    CreateBone,
    SetTransform,
    SetParent,
    SetBBone,
    SetInheritScale,
    CreateConstraint,
    SetLocks,
    SetWidget,
    SetLayers,
}

impl SkeletonOp {
    /// True for operations that change the bone graph or geometry.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SkeletonOp::CreateBone
                | SkeletonOp::SetTransform
                | SkeletonOp::SetParent
                | SkeletonOp::SetBBone
                | SkeletonOp::SetInheritScale
        )
    }
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub op: SkeletonOp,
    pub bone: String,
}

/// In-memory armature implementing [`Skeleton`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Armature {
    #[serde(default)]
    bones: Vec<BoneRecord>,
    #[serde(skip)]
    phase: Phase,
    #[serde(skip)]
    journal: Vec<JournalEntry>,
}

impl Armature {
    /// Creates an empty armature in the topology phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an armature from records in order. Parents must come first.
    pub fn from_bones(bones: impl IntoIterator<Item = BoneRecord>) -> SkeletonResult<Self> {
        let mut armature = Self::new();
        for bone in bones {
            armature.insert(bone)?;
        }
        Ok(armature)
    }

    /// Adds a bone record as-is, without journaling or phase checks.
    pub fn insert(&mut self, bone: BoneRecord) -> SkeletonResult<()> {
        if self.contains(&bone.name) {
            return Err(SkeletonError::DuplicateBone(bone.name));
        }
        if let Some(parent) = &bone.parent {
            if !self.contains(parent) {
                return Err(SkeletonError::UnknownParent {
                    bone: bone.name,
                    parent: parent.clone(),
                });
            }
        }
        self.bones.push(bone);
        Ok(())
    }

    /// Checks a deserialised armature: unique names, known parents, no cycles.
    pub fn check_integrity(&self) -> SkeletonResult<()> {
        let mut seen = HashSet::new();
        for bone in &self.bones {
            if !seen.insert(bone.name.as_str()) {
                return Err(SkeletonError::DuplicateBone(bone.name.clone()));
            }
        }
        for bone in &self.bones {
            if let Some(parent) = &bone.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(SkeletonError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    });
                }
                if self.is_ancestor(&bone.name, parent) {
                    return Err(SkeletonError::ParentCycle {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn bones(&self) -> &[BoneRecord] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BoneRecord> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Looks up a bone, failing with [`SkeletonError::UnknownBone`].
    pub fn bone(&self, name: &str) -> SkeletonResult<&BoneRecord> {
        self.get(name)
            .ok_or_else(|| SkeletonError::UnknownBone(name.to_string()))
    }

    fn bone_mut(&mut self, name: &str) -> SkeletonResult<&mut BoneRecord> {
        self.bones
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| SkeletonError::UnknownBone(name.to_string()))
    }

    /// Names of bones without a parent.
    pub fn roots(&self) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| b.name.as_str())
            .collect()
    }

    /// True if `ancestor` is `name` or one of its parents.
    pub fn is_ancestor(&self, ancestor: &str, name: &str) -> bool {
        let mut current = Some(name);
        let mut steps = 0;
        while let Some(bone) = current {
            if bone == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.bones.len() {
                // Already cyclic; treat as reaching the ancestor.
                return true;
            }
            current = self.get(bone).and_then(|b| b.parent.as_deref());
        }
        false
    }

    /// Mutating calls made since creation or the last [`clear_journal`](Self::clear_journal).
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Number of journal entries of kind `op`.
    pub fn op_count(&self, op: SkeletonOp) -> usize {
        self.journal.iter().filter(|e| e.op == op).count()
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    fn record(&mut self, op: SkeletonOp, bone: &str) {
        self.journal.push(JournalEntry {
            op,
            bone: bone.to_string(),
        });
    }

    /// Local pose matrix of a bone.
    pub fn pose(&self, name: &str) -> SkeletonResult<Mat4> {
        Ok(self.bone(name)?.pose)
    }

    /// Sets the local pose matrix of a bone.
    pub fn set_pose(&mut self, name: &str, pose: Mat4) -> SkeletonResult<()> {
        self.bone_mut(name)?.pose = pose;
        Ok(())
    }

    /// Canonical BLAKE3 hash of the bone records.
    pub fn content_hash(&self) -> SpecResult<String> {
        canonical_hash(&self.bones)
    }

    /// Parses an armature from JSON and checks its integrity.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let armature: Armature = serde_json::from_str(json)?;
        armature.check_integrity()?;
        Ok(armature)
    }
}

impl SkeletonView for Armature {
    fn contains(&self, name: &str) -> bool {
        self.bones.iter().any(|b| b.name == name)
    }

    fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    fn children(&self, name: &str) -> SkeletonResult<Vec<ChildRef>> {
        self.bone(name)?;
        Ok(self
            .bones
            .iter()
            .filter(|b| b.parent.as_deref() == Some(name))
            .map(|b| ChildRef {
                name: b.name.clone(),
                connected: b.connected,
            })
            .collect())
    }

    fn parent(&self, name: &str) -> SkeletonResult<Option<String>> {
        Ok(self.bone(name)?.parent.clone())
    }

    fn is_connected(&self, name: &str) -> SkeletonResult<bool> {
        Ok(self.bone(name)?.connected)
    }

    fn transform(&self, name: &str) -> SkeletonResult<BoneTransform> {
        Ok(self.bone(name)?.transform)
    }

    fn bbone(&self, name: &str) -> SkeletonResult<BBoneShape> {
        Ok(self.bone(name)?.bbone)
    }

    fn layers(&self, name: &str) -> SkeletonResult<LayerMask> {
        Ok(self.bone(name)?.layers)
    }
}

impl Skeleton for Armature {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn switch_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("switching armature to {} phase", phase);
            self.phase = phase;
        }
    }

    fn create_bone(&mut self, name: &str, transform: BoneTransform) -> SkeletonResult<String> {
        require_phase(self.phase, Phase::Topology, "create_bone", name)?;
        let mut actual = name.to_string();
        if self.contains(&actual) {
            let mut candidate = BoneName::parse(name);
            while self.contains(&actual) {
                candidate = candidate.bumped();
                actual = candidate.render();
            }
            debug!("bone '{}' exists, created '{}' instead", name, actual);
        }
        self.bones
            .push(BoneRecord::from_transform(actual.clone(), transform));
        self.record(SkeletonOp::CreateBone, &actual);
        Ok(actual)
    }

    fn set_transform(&mut self, name: &str, transform: BoneTransform) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Topology, "set_transform", name)?;
        self.bone_mut(name)?.transform = transform;
        self.record(SkeletonOp::SetTransform, name);
        Ok(())
    }

    fn set_parent(
        &mut self,
        name: &str,
        parent: Option<&str>,
        connected: bool,
    ) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Topology, "set_parent", name)?;
        self.bone(name)?;
        let snap_to = match parent {
            Some(p) => {
                let parent_tail = self.bone(p)?.transform.tail;
                if self.is_ancestor(name, p) {
                    return Err(SkeletonError::ParentCycle {
                        bone: name.to_string(),
                        parent: p.to_string(),
                    });
                }
                connected.then_some(parent_tail)
            }
            None => None,
        };
        let bone = self.bone_mut(name)?;
        bone.parent = parent.map(str::to_string);
        bone.connected = parent.is_some() && connected;
        if let Some(head) = snap_to {
            bone.transform.head = head;
        }
        self.record(SkeletonOp::SetParent, name);
        Ok(())
    }

    fn set_bbone(&mut self, name: &str, shape: BBoneShape) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Topology, "set_bbone", name)?;
        self.bone_mut(name)?.bbone = shape;
        self.record(SkeletonOp::SetBBone, name);
        Ok(())
    }

    fn set_inherit_scale(&mut self, name: &str, inherit: bool) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Topology, "set_inherit_scale", name)?;
        self.bone_mut(name)?.inherit_scale = inherit;
        self.record(SkeletonOp::SetInheritScale, name);
        Ok(())
    }

    fn create_constraint(&mut self, spec: &ConstraintSpec) -> SkeletonResult<ConstraintHandle> {
        require_phase(self.phase, Phase::Binding, "create_constraint", &spec.owner)?;
        self.bone(&spec.owner)?;
        for target in spec.kind.targets() {
            self.bone(target)?;
        }

        let supported = supported_params(&spec.kind);
        let mut params = BTreeMap::new();
        for (param, value) in spec.params() {
            if supported.contains(&param) {
                params.insert(param, value);
            } else {
                debug!(
                    "{} constraint on '{}' has no '{}' parameter, dropped",
                    spec.kind.name(),
                    spec.owner,
                    param
                );
            }
        }

        let owner = self.bone_mut(&spec.owner)?;
        owner.constraints.push(ConstraintRecord {
            kind: spec.kind.name().to_string(),
            params,
        });
        let index = owner.constraints.len() - 1;
        self.record(SkeletonOp::CreateConstraint, &spec.owner);
        Ok(ConstraintHandle {
            owner: spec.owner.clone(),
            index,
        })
    }

    fn set_locks(&mut self, name: &str, locks: Locks) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Binding, "set_locks", name)?;
        self.bone_mut(name)?.locks = locks;
        self.record(SkeletonOp::SetLocks, name);
        Ok(())
    }

    fn set_widget(&mut self, name: &str, widget: WidgetKind) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Binding, "set_widget", name)?;
        self.bone_mut(name)?.widget = Some(widget);
        self.record(SkeletonOp::SetWidget, name);
        Ok(())
    }

    fn set_layers(&mut self, name: &str, layers: LayerMask) -> SkeletonResult<()> {
        require_phase(self.phase, Phase::Binding, "set_layers", name)?;
        self.bone_mut(name)?.layers = layers;
        self.record(SkeletonOp::SetLayers, name);
        Ok(())
    }
}
