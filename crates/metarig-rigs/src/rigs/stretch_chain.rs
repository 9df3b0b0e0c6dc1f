//! Stretch-chain variant: guide-in, shaft, guide-out.
//!
//! The shaft is split into `bbone_elements` mechanism segments. Every inner
//! segment boundary gets a tweak, and each segment a bendy deform bone that
//! stretches to the next boundary.
//!
//! ```text
//! guide_in (control, root)
//! └─ ORG-guide_in
//!    ├─ guide_out (control)
//!    │  └─ ORG-guide_out
//!    │     └─ DEF-guide_out
//!    ├─ ORG-shaft ── stretch to ORG-guide_out
//!    │  ├─ shaft.001 ── MCH-shaft.001 ── DEF-shaft.001
//!    │  └─ shaft.002 ── MCH-shaft.002 ── DEF-shaft.002
//!    ├─ MCH-shaft.000 ── DEF-shaft.000
//!    └─ DEF-guide_in
//! ```

use metarig_spec::{
    org_name, BBoneShape, BoneCountRule, ConstraintSpec, GuideError, GuideResult, Locks,
    RigType, RoleTag, StretchChainParams, WidgetKind,
};

use super::{apply_tweak_layers, guide_error, require_guide, role_name, RigVariant};
use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;
use crate::topology::connected_chain;

const RIG_TYPE: RigType = RigType::SuperTemplate;

#[derive(Debug, Clone)]
pub struct StretchChainRig {
    params: StretchChainParams,
    /// guide-in, shaft, guide-out
    guides: Vec<String>,
}

impl StretchChainRig {
    pub fn new(
        metarig: &dyn SkeletonView,
        bone: &str,
        params: StretchChainParams,
    ) -> GuideResult<Self> {
        let guide_in = match &params.guide_in_bone {
            Some(name) => {
                require_guide(metarig, bone, RIG_TYPE, "guide-in", name)?;
                Some(name.clone())
            }
            None => metarig.parent(bone).map_err(guide_error(bone))?,
        };
        let chain = connected_chain(metarig, bone).map_err(guide_error(bone))?;

        let has_guide_in = guide_in.is_some();
        let mut guides: Vec<String> = guide_in.into_iter().collect();
        guides.push(bone.to_string());
        guides.extend(chain);

        if guides.len() != 3 {
            return Err(GuideError::BoneCount {
                bone: bone.to_string(),
                rig_type: RIG_TYPE,
                expected: BoneCountRule::Exactly(3),
                actual: guides.len(),
            });
        }
        if !has_guide_in {
            return Err(GuideError::MissingGuide {
                bone: bone.to_string(),
                rig_type: RIG_TYPE,
                role: "guide-in",
                missing: format!("parent of {}", bone),
            });
        }
        if let Some(expected) = &params.guide_out_bone {
            if expected != &guides[2] {
                return Err(GuideError::UnexpectedGuide {
                    bone: bone.to_string(),
                    rig_type: RIG_TYPE,
                    role: "guide-out",
                    expected: expected.clone(),
                    actual: guides[2].clone(),
                });
            }
        }

        Ok(Self { params, guides })
    }

    fn shaft(&self) -> &str {
        &self.guides[1]
    }
}

struct Built {
    mechanisms: Vec<String>,
    tweaks: Vec<String>,
    guide_in_ctrl: Option<String>,
    guide_out_ctrl: String,
    guide_in_def: Option<String>,
    shaft_defs: Vec<String>,
    guide_out_def: Option<String>,
}

impl StretchChainRig {
    fn make_mechanisms(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<Vec<String>> {
        let org_shaft = org_name(self.shaft());
        let shaft = draft.transform(&org_shaft)?;
        let elements = self.params.bbone_elements;
        let segment = shaft.vector() / elements as f32;
        let base = role_name(self.shaft(), RoleTag::Mechanism);

        let mut mechanisms = Vec::new();
        for i in 0..elements {
            let name = draft.copy_bone_simple(&org_shaft, &base.with_ordinal(i), "mechanism")?;
            draft.edit(&name, |t| {
                t.head = shaft.head + segment * i as f32;
                t.tail = t.head + segment;
            })?;
            mechanisms.push(name);
        }
        Ok(mechanisms)
    }

    fn make_controls(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<(Option<String>, String)> {
        let widget = WidgetKind::circle(0.5, 0.5);
        let guide_in_ctrl = if self.params.guide_in_control {
            let guide_in = &self.guides[0];
            let name =
                draft.copy_bone(&org_name(guide_in), &role_name(guide_in, RoleTag::Control), "control")?;
            draft.set_widget(&name, widget)?;
            Some(name)
        } else {
            None
        };
        let guide_out = &self.guides[2];
        let guide_out_ctrl =
            draft.copy_bone(&org_name(guide_out), &role_name(guide_out, RoleTag::Control), "control")?;
        draft.set_widget(&guide_out_ctrl, widget)?;
        Ok((guide_in_ctrl, guide_out_ctrl))
    }

    fn make_tweaks(
        &self,
        draft: &mut RigDraft<'_>,
        mechanisms: &[String],
    ) -> SkeletonResult<Vec<String>> {
        let base = role_name(self.shaft(), RoleTag::Tweak);
        let mut tweaks = Vec::new();
        for (i, mch) in mechanisms.iter().enumerate().skip(1) {
            let name = draft.copy_bone(mch, &base.with_ordinal(i as u32), "tweak")?;
            draft.scale_length(&name, 0.25)?;
            draft.set_widget(&name, WidgetKind::Sphere { radius: 1.0 })?;
            draft.set_locks(
                &name,
                Locks::free().rotation(true, false, true).scale(false, true, false),
            )?;
            apply_tweak_layers(
                draft,
                &name,
                self.params.tweak_extra_layers,
                self.params.tweak_layers,
            )?;
            tweaks.push(name);
        }
        Ok(tweaks)
    }

    fn make_deforms(
        &self,
        draft: &mut RigDraft<'_>,
        mechanisms: &[String],
    ) -> SkeletonResult<(Option<String>, Vec<String>, Option<String>)> {
        let guide_in_def = if self.params.guide_in_deform {
            let guide_in = &self.guides[0];
            Some(draft.copy_bone(&org_name(guide_in), &role_name(guide_in, RoleTag::Deform), "deform")?)
        } else {
            None
        };

        let base = role_name(self.shaft(), RoleTag::Deform);
        let mut shaft_defs = Vec::new();
        for (i, mch) in mechanisms.iter().enumerate() {
            let name = draft.copy_bone(mch, &base.with_ordinal(i as u32), "deform")?;
            draft.set_bbone(&name, BBoneShape::segments(self.params.bbone_segments))?;
            shaft_defs.push(name);
        }

        let guide_out_def = if self.params.guide_out_deform {
            let guide_out = &self.guides[2];
            Some(draft.copy_bone(&org_name(guide_out), &role_name(guide_out, RoleTag::Deform), "deform")?)
        } else {
            None
        };
        Ok((guide_in_def, shaft_defs, guide_out_def))
    }

    fn make_constraints(&self, draft: &mut RigDraft<'_>, built: &Built) {
        let org_in = org_name(&self.guides[0]);
        let org_shaft = org_name(self.shaft());
        let org_out = org_name(&self.guides[2]);

        draft.constrain(ConstraintSpec::stretch_to(&org_shaft, &org_out));

        let last = built.shaft_defs.len() - 1;
        for (i, def) in built.shaft_defs.iter().enumerate() {
            let target = if i < last {
                built.tweaks[i].clone()
            } else {
                org_out.clone()
            };
            draft.constrain(ConstraintSpec::stretch_to(def, target));

            let start = if i == 0 {
                org_in.clone()
            } else {
                built.mechanisms[i - 1].clone()
            };
            let end = if i < last {
                built.mechanisms[i + 1].clone()
            } else {
                org_out.clone()
            };
            draft.constrain(ConstraintSpec::bendy_handles(def, Some(start), Some(end)));
        }
    }

    fn parent_bones(&self, draft: &mut RigDraft<'_>, built: &Built) {
        let org_in = org_name(&self.guides[0]);
        let org_shaft = org_name(self.shaft());
        let org_out = org_name(&self.guides[2]);

        draft.parent(&built.guide_out_ctrl, Some(&org_in), false);
        for tweak in &built.tweaks {
            draft.parent(tweak, Some(&org_shaft), false);
        }

        // mechanism i hangs from the tweak at its head
        draft.parent(&built.mechanisms[0], Some(&org_in), false);
        for (mch, tweak) in built.mechanisms[1..].iter().zip(&built.tweaks) {
            draft.parent(mch, Some(tweak), false);
        }

        if let Some(def) = &built.guide_in_def {
            draft.parent(def, Some(&org_in), false);
        }
        for (def, mch) in built.shaft_defs.iter().zip(&built.mechanisms) {
            draft.parent(def, Some(mch), false);
        }
        if let Some(def) = &built.guide_out_def {
            draft.parent(def, Some(&org_out), false);
        }

        if let Some(ctrl) = &built.guide_in_ctrl {
            draft.parent(&org_in, Some(ctrl), false);
        }
        draft.parent(&org_shaft, Some(&org_in), false);
        draft.parent(&org_out, Some(&built.guide_out_ctrl), false);
    }
}

impl RigVariant for StretchChainRig {
    fn rig_type(&self) -> RigType {
        RIG_TYPE
    }

    fn bone(&self) -> &str {
        self.shaft()
    }

    fn guides(&self) -> &[String] {
        &self.guides
    }

    fn plan(&self, target: &dyn SkeletonView) -> SkeletonResult<RigPlan> {
        let mut draft = RigDraft::new(target, RIG_TYPE, self.shaft());

        let mechanisms = self.make_mechanisms(&mut draft)?;
        let (guide_in_ctrl, guide_out_ctrl) = self.make_controls(&mut draft)?;
        let tweaks = self.make_tweaks(&mut draft, &mechanisms)?;
        let (guide_in_def, shaft_defs, guide_out_def) = self.make_deforms(&mut draft, &mechanisms)?;

        let built = Built {
            mechanisms,
            tweaks,
            guide_in_ctrl,
            guide_out_ctrl,
            guide_in_def,
            shaft_defs,
            guide_out_def,
        };
        self.make_constraints(&mut draft, &built);
        self.parent_bones(&mut draft, &built);

        let root = built
            .guide_in_ctrl
            .clone()
            .unwrap_or_else(|| org_name(&self.guides[0]));
        Ok(draft.finish(root, super::orgs(&self.guides)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;
    use metarig_spec::ConstraintKind;
    use pretty_assertions::assert_eq;

    fn plan(params: StretchChainParams) -> RigPlan {
        let metarig = sample(RIG_TYPE);
        let rig = StretchChainRig::new(&metarig.armature, "shaft", params).unwrap();
        let target = crate::orchestrator::ingest(&metarig.armature).unwrap();
        rig.plan(&target).unwrap()
    }

    #[test]
    fn test_mechanisms_subdivide_shaft() {
        let plan = plan(StretchChainParams::default());
        assert_eq!(
            plan.names(RoleTag::Mechanism),
            vec!["MCH-shaft.000", "MCH-shaft.001", "MCH-shaft.002"]
        );
        for (i, name) in plan.names(RoleTag::Mechanism).iter().enumerate() {
            let t = plan.bone(name).unwrap().transform;
            assert_abs_diff_eq!(t.length(), 1.0, epsilon = 1e-5);
            assert!(t.head.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0 + i as f32), 1e-5));
        }
        assert_eq!(plan.names(RoleTag::Tweak), vec!["shaft.001", "shaft.002"]);
        assert_eq!(plan.names(RoleTag::Control), vec!["guide_in", "guide_out"]);
        assert_eq!(plan.root, "guide_in");
    }

    #[test]
    fn test_deform_constraints_in_order() {
        let plan = plan(StretchChainParams::default());
        let shaft = plan.constraints_on("ORG-shaft");
        assert_eq!(
            shaft[0].kind,
            ConstraintKind::StretchTo {
                target: "ORG-guide_out".to_string()
            }
        );

        let middle = plan.constraints_on("DEF-shaft.001");
        assert_eq!(middle.len(), 2);
        assert_eq!(middle[0].kind.targets(), vec!["shaft.002"]);
        assert_eq!(middle[1].kind.targets(), vec!["MCH-shaft.000", "MCH-shaft.002"]);

        let last = plan.constraints_on("DEF-shaft.002");
        assert_eq!(last[0].kind.targets(), vec!["ORG-guide_out"]);
        assert_eq!(plan.bone("DEF-shaft.002").unwrap().bbone.segments, 5);
    }

    #[test]
    fn test_optional_guide_in_bones() {
        let plan = plan(StretchChainParams {
            guide_in_control: false,
            guide_in_deform: false,
            ..Default::default()
        });
        assert_eq!(plan.root, "ORG-guide_in");
        assert_eq!(plan.names(RoleTag::Control), vec!["guide_out"]);
        assert!(plan.bone("DEF-guide_in").is_none());
        assert_eq!(plan.final_parent("guide_out"), Some("ORG-guide_in"));
    }

    #[test]
    fn test_rejects_two_bone_chain() {
        let metarig = sample(RIG_TYPE);
        let err = StretchChainRig::new(&metarig.armature, "guide_out", Default::default())
            .unwrap_err();
        assert_eq!(err.code(), "G001");
    }

    #[test]
    fn test_guide_out_must_match_chain() {
        let metarig = sample(RIG_TYPE);
        let params = StretchChainParams {
            guide_out_bone: Some("other".to_string()),
            ..Default::default()
        };
        let err = StretchChainRig::new(&metarig.armature, "shaft", params).unwrap_err();
        assert_eq!(err.code(), "G005");
    }
}
