//! Radial dome variant.
//!
//! The dome bone's connected children are the animatable top; its
//! unconnected children are border bones that keep the base of the dome in
//! place while the top moves. Each border gets a mechanism that stretches
//! toward the top control with its local Z rotation pinned.

use metarig_spec::{
    org_name, BoneCountRule, BoneName, ConstraintSpec, DomeParams, GuideError, GuideResult,
    LayerMask, Locks, RigType, RoleTag, WidgetKind,
};

use super::{apply_tweak_layers, guide_error, resolve_base, role_name, RigVariant};
use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;
use crate::topology::classify;

const RIG_TYPE: RigType = RigType::SuperDome;

/// Guides of a dome-like rig, as metarig names.
#[derive(Debug, Clone)]
pub(crate) struct DomeLayout {
    pub dome: String,
    pub connected: Vec<String>,
    pub borders: Vec<String>,
    pub control: Option<String>,
    /// Explicit or inherited base; `None` is synthesized at plan time.
    pub base: Option<String>,
}

impl DomeLayout {
    pub fn classify(
        metarig: &dyn SkeletonView,
        bone: &str,
        rig_type: RigType,
        base_bone: Option<&str>,
        control_prefixes: &[&str],
    ) -> GuideResult<Self> {
        let base = resolve_base(metarig, bone, rig_type, base_bone)?;
        let topology = classify(metarig, bone, control_prefixes).map_err(guide_error(bone))?;
        let layout = Self {
            dome: bone.to_string(),
            connected: topology.connected,
            borders: topology.unconnected,
            control: topology.control,
            base,
        };
        let count = layout.guides().len();
        if count < 3 {
            return Err(GuideError::BoneCount {
                bone: bone.to_string(),
                rig_type,
                expected: BoneCountRule::AtLeast(3),
                actual: count,
            });
        }
        Ok(layout)
    }

    /// Dome, connected children, then borders.
    pub fn guides(&self) -> Vec<String> {
        std::iter::once(self.dome.clone())
            .chain(self.connected.iter().cloned())
            .chain(self.borders.iter().cloned())
            .collect()
    }

    /// Name of the base bone in the target, creating a stub if there is none.
    pub fn plan_base(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<String> {
        match &self.base {
            Some(base) => Ok(org_name(base)),
            None => {
                let name = draft.copy_bone_simple(
                    &org_name(&self.dome),
                    &role_name(&self.dome, RoleTag::Mechanism),
                    "base",
                )?;
                draft.scale_length(&name, 0.25)?;
                Ok(name)
            }
        }
    }

    /// Locks shared by every dome top control.
    pub fn control_locks() -> Locks {
        Locks::free()
            .rotation(true, true, true)
            .rotation_w(true)
            .scale(true, true, true)
    }

    /// Tweaks for the connected children and borders, in that order.
    pub fn make_tweaks(
        &self,
        draft: &mut RigDraft<'_>,
        extra_layers: bool,
        layers: LayerMask,
    ) -> SkeletonResult<(Vec<String>, Vec<String>)> {
        let mut make = |guide: &str, border: bool| -> SkeletonResult<String> {
            let name = draft.copy_bone(&org_name(guide), &role_name(guide, RoleTag::Tweak), "tweak")?;
            draft.set_widget(&name, WidgetKind::Bone)?;
            draft.set_locks(
                &name,
                Locks::free()
                    .location(true, true, true)
                    .rotation(false, true, false)
                    .scale(border, border, border),
            )?;
            apply_tweak_layers(draft, &name, extra_layers, layers)?;
            Ok(name)
        };
        let connected = self
            .connected
            .iter()
            .map(|g| make(g, false))
            .collect::<SkeletonResult<Vec<_>>>()?;
        let borders = self
            .borders
            .iter()
            .map(|g| make(g, true))
            .collect::<SkeletonResult<Vec<_>>>()?;
        Ok((connected, borders))
    }
}

#[derive(Debug, Clone)]
pub struct DomeRig {
    params: DomeParams,
    layout: DomeLayout,
    guides: Vec<String>,
}

impl DomeRig {
    pub fn new(metarig: &dyn SkeletonView, bone: &str, params: DomeParams) -> GuideResult<Self> {
        let layout =
            DomeLayout::classify(metarig, bone, RIG_TYPE, params.base_bone.as_deref(), &[])?;
        let guides = layout.guides();
        Ok(Self {
            params,
            layout,
            guides,
        })
    }

    fn make_mechanisms(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<Vec<String>> {
        let dome = draft.transform(&org_name(&self.layout.dome))?;
        let mut mechanisms = Vec::new();
        for border in &self.layout.borders {
            let name = draft.copy_bone_simple(
                &org_name(border),
                &role_name(border, RoleTag::Mechanism),
                "mechanism",
            )?;
            // Z away from the dome's head, then aim at the dome's tail.
            let tail = draft.transform(&name)?.tail;
            draft.align_roll(&name, tail - dome.head)?;
            draft.set_tail(&name, dome.tail)?;
            draft.scale_length(&name, 0.5)?;
            mechanisms.push(name);
        }
        Ok(mechanisms)
    }

    fn make_control(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<String> {
        let org_dome = org_name(&self.layout.dome);
        let tail = draft.transform(&org_dome)?.tail;
        let name = draft.copy_bone(&org_dome, &BoneName::parse(&self.layout.dome), "control")?;
        draft.put_bone(&name, tail)?;
        draft.set_widget(&name, WidgetKind::Dome { size: 1.0 })?;
        draft.set_locks(&name, DomeLayout::control_locks())?;
        Ok(name)
    }
}

impl RigVariant for DomeRig {
    fn rig_type(&self) -> RigType {
        RIG_TYPE
    }

    fn bone(&self) -> &str {
        &self.layout.dome
    }

    fn guides(&self) -> &[String] {
        &self.guides
    }

    fn plan(&self, target: &dyn SkeletonView) -> SkeletonResult<RigPlan> {
        let layout = &self.layout;
        let mut draft = RigDraft::new(target, RIG_TYPE, &layout.dome);
        let base = layout.plan_base(&mut draft)?;

        let mechanisms = self.make_mechanisms(&mut draft)?;
        let ctrl = self.make_control(&mut draft)?;
        let (con_tweaks, border_tweaks) = layout.make_tweaks(
            &mut draft,
            self.params.tweak_extra_layers,
            self.params.tweak_layers,
        )?;
        let defs = self
            .guides
            .iter()
            .map(|g| draft.copy_bone(&org_name(g), &role_name(g, RoleTag::Deform), "deform"))
            .collect::<SkeletonResult<Vec<_>>>()?;

        let org_dome = org_name(&layout.dome);
        draft.constrain(ConstraintSpec::stretch_to(&org_dome, &ctrl));
        for mch in &mechanisms {
            draft.constrain(ConstraintSpec::stretch_to(mch, &ctrl));
            draft.constrain(ConstraintSpec::lock_z_rotation(mch));
        }

        let n_con = layout.connected.len();
        let (con_defs, border_defs) = defs[1..].split_at(n_con);

        draft.parent(&org_dome, Some(&base), false);
        draft.parent(&defs[0], Some(&org_dome), false);
        for ((guide, tweak), def) in layout.connected.iter().zip(&con_tweaks).zip(con_defs) {
            let org = org_name(guide);
            draft.parent(&org, Some(&ctrl), false);
            draft.parent(tweak, Some(&org), false);
            draft.parent(def, Some(tweak), false);
        }
        for ((mch, tweak), def) in mechanisms.iter().zip(&border_tweaks).zip(border_defs) {
            draft.parent(mch, Some(&base), false);
            draft.parent(tweak, Some(mch), false);
            draft.parent(def, Some(tweak), false);
        }
        draft.parent(&ctrl, Some(&base), false);

        Ok(draft.finish(base, super::orgs(&self.guides)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample;
    use glam::Vec3;
    use metarig_spec::ConstraintKind;
    use pretty_assertions::assert_eq;

    fn plan_sample() -> RigPlan {
        let metarig = sample(RIG_TYPE);
        let rig = DomeRig::new(&metarig.armature, "dome", DomeParams::default()).unwrap();
        let target = crate::orchestrator::ingest(&metarig.armature).unwrap();
        rig.plan(&target).unwrap()
    }

    #[test]
    fn test_base_defaults_to_metarig_parent() {
        let plan = plan_sample();
        assert_eq!(plan.root, "ORG-base");
        assert_eq!(plan.final_parent("ORG-dome"), Some("ORG-base"));
        assert_eq!(plan.final_parent("dome"), Some("ORG-base"));
    }

    #[test]
    fn test_border_mechanisms_stretch_with_locked_twist() {
        let plan = plan_sample();
        let mechanisms = plan.names(RoleTag::Mechanism);
        assert_eq!(mechanisms.len(), 2);
        for mch in &mechanisms {
            let stack = plan.constraints_on(mch);
            assert_eq!(stack.len(), 2);
            assert_eq!(stack[0].kind.targets(), vec!["dome"]);
            assert!(matches!(stack[1].kind, ConstraintKind::LimitRotation { z: Some(_), .. }));
            assert_eq!(plan.final_parent(mch), Some("ORG-base"));
            // half-way toward the dome tail
            let t = plan.bone(mch).unwrap().transform;
            let dome_tail = Vec3::new(0.0, 0.0, 4.0);
            assert!((t.tail - t.head).normalize().abs_diff_eq((dome_tail - t.head).normalize(), 1e-5));
        }
    }

    #[test]
    fn test_deforms_copy_every_guide() {
        let plan = plan_sample();
        assert_eq!(plan.count(RoleTag::Deform), plan.guides.len());
        assert_eq!(plan.final_parent("DEF-dome"), Some("ORG-dome"));
        assert_eq!(plan.final_parent("DEF-top"), Some("top"));
        assert_eq!(plan.final_parent("top"), Some("ORG-top"));
        assert_eq!(plan.final_parent("ORG-top"), Some("dome"));
    }

    #[test]
    fn test_missing_named_base_is_structural() {
        let metarig = sample(RIG_TYPE);
        let params = DomeParams {
            base_bone: Some("nope".to_string()),
            ..Default::default()
        };
        let err = DomeRig::new(&metarig.armature, "dome", params).unwrap_err();
        assert_eq!(err.code(), "G002");
    }

    #[test]
    fn test_base_synthesized_without_parent() {
        let mut metarig = sample(RIG_TYPE);
        metarig.armature = crate::armature::Armature::from_bones(
            metarig
                .armature
                .bones()
                .iter()
                .filter(|b| b.name != "base")
                .cloned()
                .map(|mut b| {
                    if b.parent.as_deref() == Some("base") {
                        b.parent = None;
                        b.connected = false;
                    }
                    b
                }),
        )
        .unwrap();
        let rig = DomeRig::new(&metarig.armature, "dome", DomeParams::default()).unwrap();
        let target = crate::orchestrator::ingest(&metarig.armature).unwrap();
        let plan = rig.plan(&target).unwrap();
        assert_eq!(plan.root, "MCH-dome");
        assert_eq!(plan.bone("MCH-dome").unwrap().parent, None);
    }
}
