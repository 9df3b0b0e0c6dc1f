//! Organic chain variant.
//!
//! Handles a connected chain of any length except two. Every guide gets a
//! bendy deform bone driven by a mechanism bone; the two chain ends get
//! controls and every interior guide a tweak. Chains of three or more guides
//! also get a pivot control at the middle of the chain, blended into the
//! interior mechanism controls with a parabolic falloff.
//!
//! A single guide degrades to a reversed mechanism pair between the two end
//! controls, with the deform bone's bendy handles pinned to them.

use glam::Vec3;
use metarig_spec::{
    org_name, Axis, BBoneShape, BoneCountRule, BoneName, ConstraintSpec, GuideError, GuideResult,
    Locks, OrganicChainParams, RigType, RoleTag, SingleBoneAnchor, Space, TweakAxis, WidgetKind,
};

use super::{apply_tweak_layers, guide_error, require_guide, role_name, RigVariant};
use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::geometry::{chain_direction, outward_vector};
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;
use crate::topology::connected_chain;

const RIG_TYPE: RigType = RigType::SuperLabia;

/// Influence of the pivot on the `index`-th mechanism control of a chain
/// with `len` guides: `2x - x²` with `x = index * 2 / len`.
pub fn pivot_influence(index: usize, len: usize) -> f32 {
    let x = index as f32 * 2.0 / len as f32;
    2.0 * x - x * x
}

#[derive(Debug, Clone)]
pub struct OrganicChainRig {
    params: OrganicChainParams,
    guides: Vec<String>,
    /// Metarig parent of the first guide.
    base: Option<String>,
}

/// Bones created by [`OrganicChainRig::make_chain`].
struct ChainBones {
    mch: Vec<String>,
    mch_ctrl: Vec<String>,
    mch_auto: Option<String>,
    tweaks: Vec<String>,
    /// start and end control
    ctrls: [String; 2],
    conv: Option<String>,
}

impl ChainBones {
    /// Start control, interior tweaks, end control.
    fn tweak_list(&self) -> Vec<&str> {
        std::iter::once(self.ctrls[0].as_str())
            .chain(self.tweaks.iter().map(String::as_str))
            .chain(std::iter::once(self.ctrls[1].as_str()))
            .collect()
    }
}

impl OrganicChainRig {
    pub fn new(
        metarig: &dyn SkeletonView,
        bone: &str,
        params: OrganicChainParams,
    ) -> GuideResult<Self> {
        if let Some(conv) = &params.conv_bone {
            require_guide(metarig, bone, RIG_TYPE, "convergence", conv)?;
        }
        let mut guides = vec![bone.to_string()];
        guides.extend(connected_chain(metarig, bone).map_err(guide_error(bone))?);
        let rule = BoneCountRule::OneOrAtLeast(3);
        if !rule.accepts(guides.len()) {
            return Err(GuideError::BoneCount {
                bone: bone.to_string(),
                rig_type: RIG_TYPE,
                expected: rule,
                actual: guides.len(),
            });
        }
        let base = metarig.parent(bone).map_err(guide_error(bone))?;
        Ok(Self {
            params,
            guides,
            base,
        })
    }

    fn is_single(&self) -> bool {
        self.guides.len() == 1
    }

    fn orgs(&self) -> Vec<String> {
        super::orgs(&self.guides)
    }

    /// Chain stem without ordinal, e.g. `lip.L` for `lip.003.L`.
    fn stem(&self, index: usize) -> BoneName {
        BoneName::parse(&self.guides[index]).without_ordinal()
    }

    fn plan_base(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<String> {
        match &self.base {
            Some(base) => Ok(org_name(base)),
            None => {
                let name = self
                    .stem(0)
                    .with_role(RoleTag::Mechanism)
                    .qualified("root");
                let base = draft.copy_bone_simple(&org_name(&self.guides[0]), &name, "base")?;
                draft.scale_length(&base, 0.25)?;
                Ok(base)
            }
        }
    }

    /// Orients a tweak-like bone according to `tweak_axis`.
    fn orient(
        &self,
        draft: &mut RigDraft<'_>,
        name: &str,
        chain_dir: Vec3,
        outward: Vec3,
    ) -> SkeletonResult<()> {
        let (y, (axis, other)) = match self.params.tweak_axis {
            TweakAxis::Auto => (chain_dir, (Axis::Z, -outward)),
            TweakAxis::X => (Vec3::X, (Axis::X, Vec3::Z)),
            TweakAxis::Y => (Vec3::Y, (Axis::X, Vec3::X)),
            TweakAxis::Z => (Vec3::Z, (Axis::X, Vec3::X)),
        };
        draft.align_axis(name, Axis::Y, y)?;
        draft.align_axis(name, axis, other)?;
        Ok(())
    }

    fn make_deforms(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<Vec<String>> {
        let mut defs = Vec::new();
        for guide in &self.guides {
            defs.push(draft.copy_bone(&org_name(guide), &role_name(guide, RoleTag::Deform), "deform")?);
        }
        let shape = BBoneShape::segments(self.params.bbones);
        let last = defs.len() - 1;
        for (i, def) in defs.iter().enumerate() {
            let mut shape = shape;
            if !self.is_single() {
                if i == 0 {
                    shape.ease_in = 0.0;
                }
                if i == last {
                    shape.ease_out = 0.0;
                }
            }
            draft.set_bbone(def, shape)?;
        }
        Ok(defs)
    }

    fn make_pivot(
        &self,
        draft: &mut RigDraft<'_>,
        chain_dir: Vec3,
        outward: Vec3,
    ) -> SkeletonResult<String> {
        let orgs = self.orgs();
        let index = orgs.len() / 2;
        let guide = draft.transform(&orgs[index])?;
        let mut spine_length = 0.0;
        for org in &orgs {
            spine_length += draft.transform(org)?.length();
        }

        let name = self.stem(index).qualified("pivot");
        let pivot = draft.copy_bone(&orgs[index], &name, "pivot")?;
        draft.orient_along_world(&pivot, Axis::Y, spine_length / 2.5)?;
        // mid-bone for odd chains, bone head for even ones
        let odd = (orgs.len() % 2) as f32;
        draft.put_bone(&pivot, guide.head + guide.vector() / 2.0 * odd)?;
        self.orient(draft, &pivot, chain_dir, outward)?;
        Ok(pivot)
    }

    fn make_chain(
        &self,
        draft: &mut RigDraft<'_>,
        chain_dir: Vec3,
        outward: Vec3,
    ) -> SkeletonResult<ChainBones> {
        let orgs = self.orgs();
        let last = orgs.len() - 1;
        let last_tail = draft.transform(&orgs[last])?.tail;

        let mch_auto = if self.is_single() {
            None
        } else {
            let first_head = draft.transform(&orgs[0])?.head;
            let name = self.stem(0).with_role(RoleTag::Mechanism).qualified("auto");
            let auto = draft.copy_bone(&orgs[0], &name, "auto mechanism")?;
            draft.set_head(&auto, first_head)?;
            draft.set_tail(&auto, last_tail)?;
            Some(auto)
        };

        let mut mch = Vec::new();
        if self.is_single() {
            let guide = draft.transform(&orgs[0])?;
            let name = role_name(&self.guides[0], RoleTag::Mechanism);
            let fwd = draft.copy_bone(&orgs[0], &name, "mechanism")?;
            draft.scale_length(&fwd, 0.25)?;
            let vector = draft.transform(&fwd)?.vector();
            draft.put_bone(&fwd, guide.head - vector)?;
            draft.align_axis(&fwd, Axis::Z, guide.z_axis())?;

            let rev = draft.copy_bone(&orgs[0], &name.qualified("reverse"), "reverse mechanism")?;
            draft.scale_length(&rev, 0.25)?;
            let fwd_head = draft.transform(&fwd)?.head;
            draft.set_tail(&rev, fwd_head)?;
            draft.align_axis(&rev, Axis::Z, guide.z_axis())?;
            mch.push(fwd);
            mch.push(rev);
        } else {
            for (i, guide) in self.guides.iter().enumerate() {
                let name = draft.copy_bone(&orgs[i], &role_name(guide, RoleTag::Mechanism), "mechanism")?;
                draft.scale_length(&name, 0.25)?;
                mch.push(name);
            }
            let name = role_name(&self.guides[last], RoleTag::Mechanism).qualified("end");
            let end = draft.copy_bone(&orgs[last], &name, "mechanism")?;
            draft.scale_length(&end, 0.25)?;
            draft.put_bone(&end, last_tail)?;
            mch.push(end);
        }

        let mut tweaks = Vec::new();
        let start = draft.copy_bone(&orgs[0], &self.stem(0).qualified("start"), "start control")?;
        let length = draft.transform(&start)?.length();
        draft.orient_along_world(&start, Axis::Y, length / 2.0)?;
        self.orient(draft, &start, chain_dir, outward)?;
        for (i, guide) in self.guides.iter().enumerate().skip(1) {
            let tweak = draft.copy_bone(&orgs[i], &role_name(guide, RoleTag::Tweak), "tweak")?;
            let length = draft.transform(&tweak)?.length();
            draft.orient_along_world(&tweak, Axis::Y, length / 2.0)?;
            self.orient(draft, &tweak, chain_dir, outward)?;
            tweaks.push(tweak);
        }

        let end = draft.copy_bone(&orgs[last], &self.stem(last).qualified("end"), "end control")?;
        let length = draft.transform(&end)?.length();
        draft.orient_along_world(&end, Axis::Y, length / 2.0)?;
        match &self.params.conv_bone {
            Some(conv) => draft.match_orientation(&end, &org_name(conv))?,
            None => {
                let reference = tweaks.last().unwrap_or(&start).clone();
                draft.match_orientation(&end, &reference)?;
            }
        }
        draft.put_bone(&end, last_tail)?;

        let conv = match &self.params.conv_bone {
            Some(conv) => {
                let name = role_name(conv, RoleTag::Tweak).qualified("tweak");
                let rendered = name.render();
                let tweak = if draft.contains(&rendered) {
                    rendered
                } else {
                    let tweak = draft.copy_bone(&org_name(conv), &name, "convergence tweak")?;
                    draft.set_widget(&tweak, WidgetKind::cube(0.5))?;
                    tweak
                };
                draft.share(&tweak);
                Some(tweak)
            }
            None => None,
        };

        let bones = ChainBones {
            mch,
            mch_ctrl: Vec::new(),
            mch_auto,
            tweaks,
            ctrls: [start, end],
            conv,
        };
        let mch_ctrl = self.make_mechanism_controls(draft, &bones)?;
        Ok(ChainBones { mch_ctrl, ..bones })
    }

    /// One mechanism control per guide plus one at the chain's tail, each
    /// oriented like the tweak or control it carries.
    fn make_mechanism_controls(
        &self,
        draft: &mut RigDraft<'_>,
        bones: &ChainBones,
    ) -> SkeletonResult<Vec<String>> {
        let orgs = self.orgs();
        let last = orgs.len() - 1;
        let references = bones.tweak_list();
        let mut mch_ctrl = Vec::new();
        for i in 0..=orgs.len() {
            let org = &orgs[i.min(last)];
            let guide = draft.transform(org)?;
            let mut name = role_name(&self.guides[i.min(last)], RoleTag::Mechanism).qualified("ctrl");
            if i == orgs.len() {
                name = name.qualified("end");
            }
            let ctrl = draft.copy_bone(org, &name, "mechanism control")?;
            draft.orient_along_world(&ctrl, Axis::Y, guide.length() / 6.0)?;
            draft.match_orientation(&ctrl, references[i])?;
            if i == orgs.len() {
                draft.put_bone(&ctrl, guide.tail)?;
            }
            if self.is_single() {
                draft.align_axis(&ctrl, Axis::Z, guide.z_axis())?;
            }
            draft.set_locks(&ctrl, Locks::free())?;
            mch_ctrl.push(ctrl);
        }
        Ok(mch_ctrl)
    }

    fn constrain(
        &self,
        draft: &mut RigDraft<'_>,
        defs: &[String],
        bones: &ChainBones,
        pivot: Option<&str>,
    ) {
        let tweaks = bones.tweak_list();
        for (i, def) in defs.iter().enumerate() {
            if defs.len() > 1 {
                draft.constrain(
                    ConstraintSpec::copy_transforms(def, &bones.mch[i]).spaces(Space::Pose),
                );
            }
            draft.constrain(ConstraintSpec::stretch_to(def, tweaks[i + 1]));
        }

        if let Some(pivot) = pivot {
            let last = bones.mch_ctrl.len() - 1;
            for (i, ctrl) in bones.mch_ctrl.iter().enumerate() {
                if i == 0 || i == last {
                    continue;
                }
                draft.constrain(
                    ConstraintSpec::copy_transforms(ctrl, pivot)
                        .influence(pivot_influence(i, self.guides.len()))
                        .spaces(Space::Local),
                );
            }
        }

        if let Some(auto) = &bones.mch_auto {
            draft.constrain(ConstraintSpec::copy_location(auto, &bones.mch[0]).spaces(Space::World));
            draft.constrain(ConstraintSpec::stretch_to(auto, &bones.ctrls[1]));
        }

        if let Some(pivot) = pivot {
            for ctrl in &bones.ctrls {
                draft.constrain(
                    ConstraintSpec::copy_rotation(pivot, ctrl)
                        .influence(0.33)
                        .spaces(Space::Local),
                );
            }
        }

        if self.is_single() {
            draft.constrain(ConstraintSpec::bendy_handles(
                &defs[0],
                Some(bones.mch[0].clone()),
                bones.mch_ctrl.last().cloned(),
            ));
        }
    }

    fn parent(
        &self,
        draft: &mut RigDraft<'_>,
        base: &str,
        defs: &[String],
        bones: &ChainBones,
        pivot: Option<&str>,
    ) {
        let orgs = self.orgs();
        draft.parent(&orgs[0], Some(base), false);
        for pair in orgs.windows(2) {
            draft.parent(&pair[1], Some(&pair[0]), false);
        }

        draft.parent(&defs[0], Some(&bones.mch[0]), false);
        for pair in defs.windows(2) {
            draft.parent(&pair[1], Some(&pair[0]), true);
        }

        let [start, end] = &bones.ctrls;
        let mch_ctrl = &bones.mch_ctrl;
        let last_ctrl = &mch_ctrl[mch_ctrl.len() - 1];

        if self.is_single() {
            let anchor = match self.params.single_bone_anchor {
                SingleBoneAnchor::Base => Some(base),
                SingleBoneAnchor::Detached => None,
            };
            draft.parent_without_scale(start, anchor);
            draft.parent_without_scale(end, anchor);
            draft.parent(&mch_ctrl[0], Some(start), false);
            draft.parent(last_ctrl, Some(end), false);
            draft.parent(&bones.mch[0], Some(&bones.mch[1]), false);
            draft.parent(&bones.mch[1], Some(&mch_ctrl[0]), false);
            return;
        }

        for (i, tweak) in bones.tweaks.iter().enumerate() {
            draft.parent_without_scale(tweak, Some(&mch_ctrl[i + 1]));
        }
        draft.parent_without_scale(start, Some(&mch_ctrl[0]));
        draft.parent_without_scale(end, Some(last_ctrl));

        let last_mch = bones.mch.len() - 1;
        for (i, mch) in bones.mch.iter().enumerate() {
            let parent = match i {
                0 => start,
                i if i == last_mch => end,
                i => &bones.tweaks[i - 1],
            };
            draft.parent(mch, Some(parent), false);
        }

        if let Some(auto) = &bones.mch_auto {
            draft.parent(auto, Some(base), false);
            draft.parent(&mch_ctrl[0], Some(base), false);
            draft.parent(last_ctrl, Some(base), false);
            for ctrl in &mch_ctrl[1..mch_ctrl.len() - 1] {
                draft.parent(ctrl, Some(auto), false);
            }
            if let Some(pivot) = pivot {
                draft.parent_without_scale(pivot, Some(auto));
            }
        }

        if let (Some(conv), Some(tweak)) = (&bones.conv, bones.tweaks.last()) {
            draft.parent_without_scale(tweak, Some(conv));
        }
    }

    fn locks_and_widgets(
        &self,
        draft: &mut RigDraft<'_>,
        bones: &ChainBones,
        pivot: Option<&str>,
    ) -> SkeletonResult<()> {
        let twist_only = Locks::free().rotation(true, false, true);
        for tweak in &bones.tweaks {
            draft.set_locks(tweak, twist_only)?;
            draft.set_widget(tweak, WidgetKind::cube(0.2))?;
            apply_tweak_layers(
                draft,
                tweak,
                self.params.tweak_extra_layers,
                self.params.tweak_layers,
            )?;
        }
        for (ctrl, invert) in bones.ctrls.iter().zip([false, true]) {
            draft.set_locks(ctrl, twist_only)?;
            draft.set_widget(ctrl, WidgetKind::Chain { radius: 0.3, invert })?;
        }
        if let Some(pivot) = pivot {
            draft.set_locks(pivot, twist_only)?;
            draft.set_widget(pivot, WidgetKind::cube(0.15))?;
        }
        Ok(())
    }
}

impl RigVariant for OrganicChainRig {
    fn rig_type(&self) -> RigType {
        RIG_TYPE
    }

    fn bone(&self) -> &str {
        &self.guides[0]
    }

    fn guides(&self) -> &[String] {
        &self.guides
    }

    fn plan(&self, target: &dyn SkeletonView) -> SkeletonResult<RigPlan> {
        let orgs = self.orgs();
        let mut draft = RigDraft::new(target, RIG_TYPE, self.guides[0].as_str());
        let base = self.plan_base(&mut draft)?;

        let first = draft.transform(&orgs[0])?;
        let last = draft.transform(&orgs[orgs.len() - 1])?;
        let chain_dir = chain_direction(&first, &last);
        let outward = outward_vector(&first, chain_dir);

        let defs = self.make_deforms(&mut draft)?;
        let pivot = if orgs.len() > 2 {
            Some(self.make_pivot(&mut draft, chain_dir, outward)?)
        } else {
            None
        };
        let bones = self.make_chain(&mut draft, chain_dir, outward)?;

        self.constrain(&mut draft, &defs, &bones, pivot.as_deref());
        self.locks_and_widgets(&mut draft, &bones, pivot.as_deref())?;
        self.parent(&mut draft, &base, &defs, &bones, pivot.as_deref());

        Ok(draft.finish(base, orgs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armature::{Armature, BoneRecord};
    use crate::metarig::Metarig;
    use crate::samples::sample;
    use approx::assert_abs_diff_eq;
    use metarig_spec::ConstraintKind;
    use pretty_assertions::assert_eq;

    const BONE: &str = "lip.L";

    fn plan_for(metarig: &Metarig, bone: &str, params: OrganicChainParams) -> RigPlan {
        let rig = OrganicChainRig::new(&metarig.armature, bone, params).unwrap();
        let target = crate::orchestrator::ingest(&metarig.armature).unwrap();
        rig.plan(&target).unwrap()
    }

    fn single(anchor: SingleBoneAnchor) -> RigPlan {
        let metarig = Metarig::new(
            Armature::from_bones([
                BoneRecord::new("hip", Vec3::ZERO, Vec3::Z),
                BoneRecord::new("flap", Vec3::Z, Vec3::new(0.0, 1.0, 1.0)).parent("hip"),
            ])
            .unwrap(),
        );
        let params = OrganicChainParams {
            single_bone_anchor: anchor,
            ..Default::default()
        };
        plan_for(&metarig, "flap", params)
    }

    #[test]
    fn test_pivot_influence_is_parabolic() {
        assert_abs_diff_eq!(pivot_influence(0, 5), 0.0);
        assert_abs_diff_eq!(pivot_influence(1, 5), 0.64, epsilon = 1e-6);
        assert_abs_diff_eq!(pivot_influence(2, 4), 1.0);
        assert_abs_diff_eq!(pivot_influence(3, 4), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_two_guides_rejected() {
        let metarig = Metarig::new(
            Armature::from_bones([
                BoneRecord::new("a", Vec3::ZERO, Vec3::Z),
                BoneRecord::new("b", Vec3::Z, Vec3::Z * 2.0).parent("a").connected(),
            ])
            .unwrap(),
        );
        let err = OrganicChainRig::new(&metarig.armature, "a", OrganicChainParams::default())
            .unwrap_err();
        assert_eq!(err.code(), "G001");
    }

    #[test]
    fn test_chain_bone_counts() {
        let plan = plan_for(&sample(RIG_TYPE), BONE, OrganicChainParams::default());
        assert_eq!(plan.guides.len(), 5);
        assert_eq!(plan.count(RoleTag::Deform), 5);
        assert_eq!(
            plan.names(RoleTag::Tweak),
            vec!["lip.001.L", "lip.002.L", "lip.003.L", "lip.004.L"]
        );
        // start, end and pivot
        assert_eq!(plan.count(RoleTag::Control), 3);
        // per-guide mechanisms, the end mechanism, mechanism controls and auto
        assert_eq!(plan.count(RoleTag::Mechanism), 6 + 6 + 1);
        assert!(plan.bone("lip_pivot.L").is_some());
        assert!(plan.bone("MCH-lip_auto.L").is_some());
        assert_eq!(plan.root, "ORG-pelvis");
    }

    #[test]
    fn test_deforms_follow_mechanisms_and_stretch_to_tweaks() {
        let plan = plan_for(&sample(RIG_TYPE), BONE, OrganicChainParams::default());
        let stack = plan.constraints_on("DEF-lip.L");
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].kind.targets(), vec!["MCH-lip.L"]);
        assert_eq!(stack[0].owner_space, Space::Pose);
        assert_eq!(stack[1].kind.targets(), vec!["lip.001.L"]);
        let last = plan.constraints_on("DEF-lip.004.L");
        assert_eq!(last[1].kind.targets(), vec!["lip_end.L"]);

        assert_eq!(plan.bone("DEF-lip.L").unwrap().bbone.ease_in, 0.0);
        assert_eq!(plan.bone("DEF-lip.004.L").unwrap().bbone.ease_out, 0.0);
        assert_eq!(plan.bone("DEF-lip.002.L").unwrap().bbone, BBoneShape::segments(10));
        assert_eq!(plan.final_parent("DEF-lip.L"), Some("MCH-lip.L"));
        assert_eq!(plan.final_parent("DEF-lip.001.L"), Some("DEF-lip.L"));
    }

    #[test]
    fn test_interior_mechanism_controls_blend_toward_pivot() {
        let plan = plan_for(&sample(RIG_TYPE), BONE, OrganicChainParams::default());
        let blends: Vec<_> = plan
            .constraints
            .iter()
            .filter(|c| c.kind.targets() == vec!["lip_pivot.L"])
            .collect();
        assert_eq!(blends.len(), 4);
        for (i, blend) in blends.iter().enumerate() {
            assert_abs_diff_eq!(blend.influence, pivot_influence(i + 1, 5), epsilon = 1e-6);
            assert_eq!(blend.owner_space, Space::Local);
            assert_eq!(plan.final_parent(&blend.owner), Some("MCH-lip_auto.L"));
        }
        let pivot = plan.constraints_on("lip_pivot.L");
        assert_eq!(pivot.len(), 2);
        assert!(pivot.iter().all(|c| c.influence == 0.33));
        assert_eq!(plan.final_parent("lip_pivot.L"), Some("MCH-lip_auto.L"));
    }

    #[test]
    fn test_pivot_sits_mid_bone_for_odd_chains() {
        let metarig = sample(RIG_TYPE);
        let guide = metarig.armature.bone("lip.002.L").unwrap().transform;
        let plan = plan_for(&metarig, BONE, OrganicChainParams::default());
        let pivot = plan.bone("lip_pivot.L").unwrap().transform;
        assert!(pivot.head.abs_diff_eq((guide.head + guide.tail) / 2.0, 1e-5));
    }

    #[test]
    fn test_tweak_axis_orients_tweaks() {
        let params = OrganicChainParams {
            tweak_axis: TweakAxis::Z,
            ..Default::default()
        };
        let plan = plan_for(&sample(RIG_TYPE), BONE, params);
        for tweak in plan.names(RoleTag::Tweak) {
            let t = plan.bone(tweak).unwrap().transform;
            assert!(t.y_axis().abs_diff_eq(Vec3::Z, 1e-5), "{tweak}");
            assert!(t.x_axis().abs_diff_eq(Vec3::X, 1e-5), "{tweak}");
        }
    }

    #[test]
    fn test_auto_mechanism_spans_chain() {
        let metarig = sample(RIG_TYPE);
        let plan = plan_for(&metarig, BONE, OrganicChainParams::default());
        let auto = plan.bone("MCH-lip_auto.L").unwrap().transform;
        assert!(auto.head.abs_diff_eq(metarig.armature.bone(BONE).unwrap().transform.head, 1e-6));
        assert!(auto.tail.abs_diff_eq(metarig.armature.bone("lip.004.L").unwrap().transform.tail, 1e-6));
        let stack = plan.constraints_on("MCH-lip_auto.L");
        assert!(matches!(stack[0].kind, ConstraintKind::CopyLocation { .. }));
        assert_eq!(stack[1].kind.targets(), vec!["lip_end.L"]);
    }

    #[test]
    fn test_single_bone_builds_reversed_pair() {
        let plan = single(SingleBoneAnchor::Base);
        assert_eq!(plan.count(RoleTag::Deform), 1);
        assert!(plan.bone("MCH-flap_reverse").is_some());
        assert!(plan.bone("flap_pivot").is_none());
        assert_eq!(plan.final_parent("MCH-flap"), Some("MCH-flap_reverse"));
        assert_eq!(plan.final_parent("MCH-flap_reverse"), Some("MCH-flap_ctrl"));
        assert_eq!(plan.final_parent("flap_start"), Some("ORG-hip"));
        assert_eq!(plan.bone("DEF-flap").unwrap().bbone, BBoneShape::segments(10));

        let stack = plan.constraints_on("DEF-flap");
        assert_eq!(stack.len(), 2);
        assert_eq!(
            stack[1].kind,
            ConstraintKind::BendyHandles {
                start: Some("MCH-flap".to_string()),
                end: Some("MCH-flap_ctrl_end".to_string()),
            }
        );
        // the reversed pair meets at the guide's head
        let fwd = plan.bone("MCH-flap").unwrap().transform;
        let rev = plan.bone("MCH-flap_reverse").unwrap().transform;
        assert!(fwd.tail.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(rev.tail.abs_diff_eq(fwd.head, 1e-6));
    }

    #[test]
    fn test_single_bone_detached_controls() {
        let plan = single(SingleBoneAnchor::Detached);
        assert_eq!(plan.final_parent("flap_start"), None);
        assert_eq!(plan.final_parent("flap_end"), None);
    }

    #[test]
    fn test_convergence_tweak_is_shared() {
        let mut metarig = sample(RIG_TYPE);
        metarig
            .armature
            .insert(BoneRecord::new("tip", Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 6.0)))
            .unwrap();
        let params = OrganicChainParams {
            conv_bone: Some("tip".to_string()),
            ..Default::default()
        };
        let plan = plan_for(&metarig, BONE, params);
        assert_eq!(plan.shared, vec!["tip_tweak".to_string()]);
        assert_eq!(plan.role_of("tip_tweak"), Some(RoleTag::Tweak));
        assert_eq!(plan.final_parent("lip.004.L"), Some("tip_tweak"));
        let end = plan.bone("lip_end.L").unwrap().transform;
        assert!(end.y_axis().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_missing_convergence_bone_is_structural() {
        let params = OrganicChainParams {
            conv_bone: Some("nope".to_string()),
            ..Default::default()
        };
        let err = OrganicChainRig::new(&sample(RIG_TYPE).armature, BONE, params).unwrap_err();
        assert_eq!(err.code(), "G002");
    }
}
