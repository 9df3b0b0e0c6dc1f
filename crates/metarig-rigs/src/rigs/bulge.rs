//! Wobble-bulge variant.
//!
//! Like the dome, but each border deform is a bendy bone running to the top
//! of the dome, with a head/tail mechanism pair as its custom handles.
//! Optional Z-helper stubs give every mechanism and border deform a stable
//! roll.

use glam::Vec3;
use metarig_spec::{
    org_name, BBoneShape, BoneName, BulgeParams, ConstraintSpec, GuideResult, RigType, RoleTag,
    WidgetKind,
};

use super::dome::DomeLayout;
use super::{role_name, RigVariant};
use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;
use crate::topology::CONTROL_PREFIXES;

const RIG_TYPE: RigType = RigType::SuperBulge;

#[derive(Debug, Clone)]
pub struct BulgeRig {
    params: BulgeParams,
    layout: DomeLayout,
    guides: Vec<String>,
}

/// Head and tail handle of one border.
struct HandlePair {
    head: String,
    tail: String,
}

impl BulgeRig {
    pub fn new(metarig: &dyn SkeletonView, bone: &str, params: BulgeParams) -> GuideResult<Self> {
        let layout = DomeLayout::classify(
            metarig,
            bone,
            RIG_TYPE,
            params.base_bone.as_deref(),
            &CONTROL_PREFIXES,
        )?;
        let mut guides = layout.guides();
        guides.extend(layout.control.iter().cloned());
        Ok(Self {
            params,
            layout,
            guides,
        })
    }

    /// Rolls `bone` away from the dome's head, adding a Z-helper stub if enabled.
    fn gen_zhelper(
        &self,
        draft: &mut RigDraft<'_>,
        bone: &str,
        base: &str,
        dome_head: Vec3,
    ) -> SkeletonResult<()> {
        let target = draft.transform(bone)?;
        if self.params.zhelper_bones {
            let name = BoneName::parse(bone)
                .with_role(RoleTag::Mechanism)
                .qualified("zh");
            let zh = draft.copy_bone_simple(&org_name(&self.layout.dome), &name, "z-helper")?;
            draft.set_tail(&zh, target.head)?;
            draft.scale_length(&zh, 0.25)?;
            draft.put_bone(&zh, target.tail)?;
            draft.parent(&zh, Some(base), false);
        }
        draft.align_roll(bone, target.head - dome_head)?;
        Ok(())
    }

    fn make_mechanisms(
        &self,
        draft: &mut RigDraft<'_>,
        base: &str,
    ) -> SkeletonResult<Vec<HandlePair>> {
        let dome = draft.transform(&org_name(&self.layout.dome))?;
        let mut pairs = Vec::new();
        for border in &self.layout.borders {
            let org = org_name(border);
            let guide = draft.transform(&org)?;
            let name = role_name(border, RoleTag::Mechanism);

            let head = draft.copy_bone_simple(&org, &name.qualified("head"), "handle")?;
            draft.put_bone(&head, guide.head + (guide.head - guide.tail))?;
            self.gen_zhelper(draft, &head, base, dome.head)?;

            let tail = draft.copy_bone_simple(&org, &name.qualified("tail"), "handle")?;
            draft.set_tail(&tail, dome.head)?;
            draft.scale_length(&tail, 0.5)?;
            draft.put_bone(&tail, dome.tail)?;
            self.gen_zhelper(draft, &tail, base, dome.head)?;

            pairs.push(HandlePair { head, tail });
        }
        Ok(pairs)
    }

    fn make_control(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<String> {
        let org_dome = org_name(&self.layout.dome);
        let name = BoneName::parse(&self.layout.dome);
        let ctrl = match &self.layout.control {
            Some(control) => draft.copy_bone_simple(&org_name(control), &name, "control")?,
            None => {
                let tail = draft.transform(&org_dome)?.tail;
                let ctrl = draft.copy_bone_simple(&org_dome, &name, "control")?;
                draft.put_bone(&ctrl, tail)?;
                ctrl
            }
        };
        draft.set_widget(&ctrl, WidgetKind::Dome { size: 1.0 })?;
        draft.set_locks(&ctrl, DomeLayout::control_locks())?;
        Ok(ctrl)
    }
}

impl RigVariant for BulgeRig {
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
        let org_dome = org_name(&layout.dome);
        let mut draft = RigDraft::new(target, RIG_TYPE, &layout.dome);
        let base = layout.plan_base(&mut draft)?;
        let dome = draft.transform(&org_dome)?;

        let pairs = self.make_mechanisms(&mut draft, &base)?;
        let ctrl = self.make_control(&mut draft)?;
        let (con_tweaks, border_tweaks) = layout.make_tweaks(
            &mut draft,
            self.params.tweak_extra_layers,
            self.params.tweak_layers,
        )?;

        let mut con_defs = Vec::new();
        for guide in &layout.connected {
            con_defs.push(draft.copy_bone(&org_name(guide), &role_name(guide, RoleTag::Deform), "deform")?);
        }
        let mut border_defs = Vec::new();
        for guide in &layout.borders {
            let def = draft.copy_bone(&org_name(guide), &role_name(guide, RoleTag::Deform), "deform")?;
            draft.set_tail(&def, dome.tail)?;
            draft.set_bbone(&def, BBoneShape::segments(self.params.bbone_segments))?;
            self.gen_zhelper(&mut draft, &def, &base, dome.head)?;
            border_defs.push(def);
        }

        draft.constrain(ConstraintSpec::stretch_to(&org_dome, &ctrl));
        for (def, pair) in border_defs.iter().zip(&pairs) {
            draft.constrain(ConstraintSpec::stretch_to(def, &ctrl));
            draft.constrain(ConstraintSpec::bendy_handles(
                def,
                Some(pair.head.clone()),
                Some(pair.tail.clone()),
            ));
        }

        draft.parent(&org_dome, Some(&base), false);
        for ((guide, tweak), def) in layout.connected.iter().zip(&con_tweaks).zip(&con_defs) {
            let org = org_name(guide);
            draft.parent(&org, Some(&ctrl), false);
            draft.parent(tweak, Some(&org), false);
            draft.parent(def, Some(tweak), false);
        }
        for (((guide, tweak), def), pair) in layout
            .borders
            .iter()
            .zip(&border_tweaks)
            .zip(&border_defs)
            .zip(&pairs)
        {
            let org = org_name(guide);
            draft.parent(&org, Some(&base), false);
            draft.parent(tweak, Some(&org), false);
            draft.parent(def, Some(tweak), false);
            draft.parent(&pair.head, Some(tweak), false);
            draft.parent(&pair.tail, Some(&ctrl), false);
        }
        draft.parent(&ctrl, Some(&base), false);

        Ok(draft.finish(base, super::orgs(&self.guides)))
    }
}
