//! Generation orchestrator.
//!
//! Every rig instance runs through four linear states:
//!
//! ```text
//! Init ─► BuildTopology ─► Bind ─► Parented
//! ```
//!
//! `Init` validates all assignments against the metarig before anything is
//! touched. The metarig is then copied into the target as `ORG-` bones and
//! each rig is planned and replayed in assignment order: bones in the
//! topology phase, constraints and pose settings in the binding phase, and
//! final parenting back in the topology phase. A failure after `Init`
//! leaves the bones created so far in place.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use metarig_spec::hash::canonical_hash;
use metarig_spec::{org_name, GuideError, GuideResult, RigType, RoleTag, SpecResult};
use serde::Serialize;

use crate::armature::Armature;
use crate::emission::emit_constraints;
use crate::error::{GenerationError, GenerationResult, SkeletonError, SkeletonResult};
use crate::metarig::Metarig;
use crate::plan::RigPlan;
use crate::rigs::{init_rig, RigVariant};
use crate::skeleton::{Phase, Skeleton, SkeletonView};

/// Per-instance generation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RigState {
    Init,
    BuildTopology,
    Bind,
    Parented,
}

impl std::fmt::Display for RigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RigState::Init => "init",
            RigState::BuildTopology => "build_topology",
            RigState::Bind => "bind",
            RigState::Parented => "parented",
        };
        write!(f, "{}", s)
    }
}

/// What one rig instance added to the target, with actual host names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigReport {
    pub bone: String,
    pub rig_type: RigType,
    pub root: String,
    /// ORG bones of the rig's guides.
    pub guides: Vec<String>,
    pub shared: Vec<String>,
    /// Created bones in creation order.
    pub bones: Vec<(String, RoleTag)>,
    pub constraint_count: usize,
}

impl RigReport {
    /// Created bones per role tier.
    pub fn tier_counts(&self) -> BTreeMap<RoleTag, usize> {
        let mut counts = BTreeMap::new();
        for (_, role) in &self.bones {
            *counts.entry(*role).or_insert(0) += 1;
        }
        counts
    }

    /// Names of created bones with `role`.
    pub fn names(&self, role: RoleTag) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

/// Result of a full generation pass.
#[derive(Debug, Clone)]
pub struct GeneratedRig {
    pub armature: Armature,
    pub reports: Vec<RigReport>,
}

impl GeneratedRig {
    /// Canonical hash of the generated armature.
    pub fn content_hash(&self) -> SpecResult<String> {
        self.armature.content_hash()
    }

    /// Canonical hash of the per-rig reports.
    pub fn report_hash(&self) -> SpecResult<String> {
        canonical_hash(&self.reports)
    }
}

/// Copies every metarig bone into `target` as an `ORG-` bone.
///
/// Geometry, roll, bendy settings, parent (mapped to its `ORG-` copy),
/// connect flag and layers are preserved. Leaves `target` in the topology
/// phase.
pub fn ingest_into(metarig: &dyn SkeletonView, target: &mut dyn Skeleton) -> SkeletonResult<()> {
    target.switch_phase(Phase::Topology);
    let names = metarig.bone_names();
    for name in &names {
        let org = org_name(name);
        let created = target.create_bone(&org, metarig.transform(name)?)?;
        if created != org {
            return Err(SkeletonError::DuplicateBone(org));
        }
        let bbone = metarig.bbone(name)?;
        if !bbone.is_default() {
            target.set_bbone(&org, bbone)?;
        }
    }
    for name in &names {
        if let Some(parent) = metarig.parent(name)? {
            target.set_parent(
                &org_name(name),
                Some(&org_name(&parent)),
                metarig.is_connected(name)?,
            )?;
        }
    }
    target.switch_phase(Phase::Binding);
    for name in &names {
        target.set_layers(&org_name(name), metarig.layers(name)?)?;
    }
    target.switch_phase(Phase::Topology);
    debug!("ingested {} metarig bones", names.len());
    Ok(())
}

/// Ingests `metarig` into a fresh armature.
pub fn ingest(metarig: &Armature) -> SkeletonResult<Armature> {
    let mut target = Armature::new();
    ingest_into(metarig, &mut target)?;
    target.clear_journal();
    Ok(target)
}

/// Runs `Init` for every assignment and collects all structural errors.
pub fn validate_metarig(metarig: &Metarig) -> Vec<GuideError> {
    metarig
        .rigs
        .iter()
        .filter_map(|assignment| init_rig(&metarig.armature, assignment).err())
        .collect()
}

/// Runs `Init` for every assignment, stopping at the first structural error.
pub fn init_rigs(metarig: &Metarig) -> GuideResult<Vec<Box<dyn RigVariant>>> {
    metarig
        .rigs
        .iter()
        .map(|assignment| init_rig(&metarig.armature, assignment))
        .collect()
}

fn log_state(plan: &RigPlan, state: RigState) {
    debug!("{} on '{}': {}", plan.rig_type, plan.bone, state);
}

/// Replays a plan through the phase-correct skeleton calls.
///
/// Bones the host renames are tracked, and every later reference to them
/// (parents, constraint owners and targets) uses the actual name.
pub fn apply_plan(skeleton: &mut dyn Skeleton, plan: &RigPlan) -> SkeletonResult<RigReport> {
    log_state(plan, RigState::BuildTopology);
    skeleton.switch_phase(Phase::Topology);
    let mut renamed: HashMap<String, String> = HashMap::new();
    let mut bones = Vec::with_capacity(plan.bones.len());
    for bone in &plan.bones {
        let actual = skeleton.create_bone(&bone.name, bone.transform)?;
        if actual != bone.name {
            renamed.insert(bone.name.clone(), actual.clone());
        }
        bones.push((actual, bone.role));
    }
    let rename = |name: &str| renamed.get(name).cloned().unwrap_or_else(|| name.to_string());
    for bone in &plan.bones {
        let name = rename(&bone.name);
        if let Some(parent) = &bone.parent {
            skeleton.set_parent(&name, Some(&rename(parent)), false)?;
        }
        if !bone.bbone.is_default() {
            skeleton.set_bbone(&name, bone.bbone)?;
        }
    }

    log_state(plan, RigState::Bind);
    skeleton.switch_phase(Phase::Binding);
    let handles = emit_constraints(skeleton, &plan.constraints, rename)?;
    for bone in &plan.bones {
        let name = rename(&bone.name);
        if let Some(locks) = bone.locks {
            skeleton.set_locks(&name, locks)?;
        }
        if let Some(widget) = bone.widget {
            skeleton.set_widget(&name, widget)?;
        }
        if let Some(layers) = bone.layers {
            skeleton.set_layers(&name, layers)?;
        }
    }

    log_state(plan, RigState::Parented);
    skeleton.switch_phase(Phase::Topology);
    for link in &plan.parents {
        let child = rename(&link.child);
        let parent = link.parent.as_deref().map(rename);
        skeleton.set_parent(&child, parent.as_deref(), link.connected)?;
        if let Some(inherit) = link.inherit_scale {
            skeleton.set_inherit_scale(&child, inherit)?;
        }
    }

    Ok(RigReport {
        bone: plan.bone.clone(),
        rig_type: plan.rig_type,
        root: rename(&plan.root),
        guides: plan.guides.clone(),
        shared: plan.shared.iter().map(|s| rename(s)).collect(),
        bones,
        constraint_count: handles.len(),
    })
}

/// Generates every rig of `metarig` into `target`.
///
/// Structural guide errors are returned before `target` is touched.
pub fn generate_into<S: Skeleton>(
    metarig: &Metarig,
    target: &mut S,
) -> GenerationResult<Vec<RigReport>> {
    let rigs = init_rigs(metarig)?;
    ingest_into(&metarig.armature, &mut *target)?;

    let mut reports = Vec::with_capacity(rigs.len());
    for rig in &rigs {
        info!("generating {} on '{}'", rig.rig_type(), rig.bone());
        let fail = |e| GenerationError::in_rig(rig.bone(), rig.rig_type(), e);
        let plan = rig.plan(&*target).map_err(fail)?;
        let report = apply_plan(&mut *target, &plan).map_err(fail)?;
        info!(
            "{} on '{}': {} bones, {} constraints",
            rig.rig_type(),
            rig.bone(),
            report.bones.len(),
            report.constraint_count
        );
        reports.push(report);
    }
    Ok(reports)
}

/// Generates every rig of `metarig` into a fresh armature.
pub fn generate(metarig: &Metarig) -> GenerationResult<GeneratedRig> {
    let mut armature = Armature::new();
    let reports = generate_into(metarig, &mut armature)?;
    Ok(GeneratedRig { armature, reports })
}
