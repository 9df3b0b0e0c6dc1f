//! Radial ring variant.
//!
//! Two wings of deform bones are swept around the radial guide's local X
//! axis, starting at its tail. Every element keeps the radial bone's length
//! and turns by the same step, so each wing is half of a regular polygon
//! closing on the radial line.
//! An optional sizing guide becomes the only control, scaling the radial
//! bone along Y.

use std::f32::consts::{FRAC_PI_2, PI};

use metarig_spec::{
    org_name, Axis, AxisFlags, BoneName, ConstraintSpec, GuideResult, Locks, RigType, RingParams,
    RoleTag, WidgetKind,
};

use super::{require_guide, RigVariant};
use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::geometry::rotate_around_axis;
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;

const RIG_TYPE: RigType = RigType::SuperRing;

/// Rotation applied to each element of one wing, in radians.
///
/// The first element turns a right angle onto the tangent and then half a
/// step onto its chord; every later element turns a full step of `π / n`.
pub fn wing_turns(wing_elements: u32) -> Vec<f32> {
    let n = wing_elements.max(1);
    let step = PI / n as f32;
    std::iter::once(FRAC_PI_2 + step / 2.0)
        .chain(std::iter::repeat(step).take(n as usize - 1))
        .collect()
}

#[derive(Debug, Clone)]
pub struct RingRig {
    params: RingParams,
    /// radial guide, then the sizing guide if any
    guides: Vec<String>,
}

impl RingRig {
    pub fn new(metarig: &dyn SkeletonView, bone: &str, params: RingParams) -> GuideResult<Self> {
        let mut guides = vec![bone.to_string()];
        if let Some(sizing) = &params.sizing_bone {
            require_guide(metarig, bone, RIG_TYPE, "sizing", sizing)?;
            guides.push(sizing.clone());
        }
        Ok(Self { params, guides })
    }

    fn sizing(&self) -> Option<&str> {
        self.guides.get(1).map(String::as_str)
    }

    fn make_control(&self, draft: &mut RigDraft<'_>) -> SkeletonResult<Option<String>> {
        let Some(sizing) = self.sizing() else {
            return Ok(None);
        };
        let ctrl = draft.copy_bone(&org_name(sizing), &BoneName::parse(sizing), "sizing control")?;
        draft.set_widget(&ctrl, WidgetKind::circle(1.0, 0.0))?;
        draft.set_locks(
            &ctrl,
            Locks::free()
                .location(true, true, true)
                .rotation(true, true, true)
                .rotation_w(true),
        )?;
        Ok(Some(ctrl))
    }

    /// One wing of connected deform bones; `sign` picks the sweep direction.
    fn make_wing(
        &self,
        draft: &mut RigDraft<'_>,
        sign: f32,
        first_ordinal: u32,
    ) -> SkeletonResult<Vec<String>> {
        let org_radial = org_name(&self.guides[0]);
        let radial = draft.transform(&org_radial)?;
        let axis = radial.axis(Axis::X);
        let stem = BoneName::parse(&self.guides[0]).with_role(RoleTag::Deform);

        let mut wing = Vec::new();
        let mut prev = org_radial;
        for (i, turn) in wing_turns(self.params.wing_elements).into_iter().enumerate() {
            let name = stem.with_ordinal(first_ordinal + i as u32);
            let start = draft.transform(&prev)?.tail;
            let def = draft.copy_bone_simple(&prev, &name, "wing")?;
            draft.edit(&def, |t| {
                t.move_head_to(start);
                t.tail = t.head + rotate_around_axis(t.vector(), sign * turn, axis);
            })?;
            wing.push(def.clone());
            prev = def;
        }
        Ok(wing)
    }
}

impl RigVariant for RingRig {
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
        let radial = &self.guides[0];
        let org_radial = org_name(radial);
        let mut draft = RigDraft::new(target, RIG_TYPE, radial.as_str());

        let ctrl = self.make_control(&mut draft)?;
        let n = self.params.wing_elements;
        let wings = [
            self.make_wing(&mut draft, 1.0, 1)?,
            self.make_wing(&mut draft, -1.0, n + 1)?,
        ];

        if let Some(ctrl) = &ctrl {
            draft.constrain(ConstraintSpec::copy_scale(
                &org_radial,
                ctrl,
                AxisFlags::only(Axis::Y),
            ));
        }

        if let Some(sizing) = self.sizing() {
            draft.parent_without_scale(&org_name(sizing), Some(&org_radial));
        }
        if let Some(ctrl) = &ctrl {
            draft.parent_without_scale(ctrl, Some(&org_radial));
        }
        for wing in &wings {
            let mut prev = org_radial.as_str();
            for def in wing {
                draft.parent(def, Some(prev), true);
                prev = def;
            }
        }

        Ok(draft.finish(org_radial.clone(), super::orgs(&self.guides)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;
    use metarig_spec::{ConstraintKind, GuideError};
    use pretty_assertions::assert_eq;

    fn plan_with(params: RingParams) -> RigPlan {
        let metarig = sample(RIG_TYPE);
        let rig = RingRig::new(&metarig.armature, "ring_radius", params).unwrap();
        let target = crate::orchestrator::ingest(&metarig.armature).unwrap();
        rig.plan(&target).unwrap()
    }

    fn with_elements(wing_elements: u32) -> RingParams {
        RingParams {
            wing_elements,
            ..Default::default()
        }
    }

    #[test]
    fn test_wing_turns() {
        let turns = wing_turns(3);
        assert_eq!(turns.len(), 3);
        assert_abs_diff_eq!(turns[0], 120f32.to_radians(), epsilon = 1e-6);
        assert_abs_diff_eq!(turns[1], 60f32.to_radians(), epsilon = 1e-6);
        assert_eq!(wing_turns(1), vec![PI]);
    }

    #[test]
    fn test_first_element_turns_quarter_plus_half_step() {
        let plan = plan_with(with_elements(3));
        let first = plan.bone("DEF-ring_radius.001").unwrap().transform;
        assert!(first.head.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-6));
        assert!(first.tail.abs_diff_eq(Vec3::new(0.5, 0.0, 1.0 + 0.75f32.sqrt()), 1e-5));
        let mirrored = plan.bone("DEF-ring_radius.004").unwrap().transform;
        assert!(mirrored.tail.abs_diff_eq(Vec3::new(0.5, 0.0, 1.0 - 0.75f32.sqrt()), 1e-5));
    }

    #[test]
    fn test_each_wing_sweeps_half_a_turn() {
        for n in 1..=6u32 {
            let turns = wing_turns(n);
            // chord steps: the tangent quarter turn is not part of the sweep,
            // and the last chord leaves half a step to the closing tangent
            let sweep: f32 = turns.iter().sum::<f32>() - FRAC_PI_2 + PI / (2 * n) as f32;
            assert_abs_diff_eq!(sweep, PI, epsilon = 1e-5);

            let plan = plan_with(with_elements(n));
            assert_eq!(plan.count(RoleTag::Deform), 2 * n as usize);
            // both wings close on the radial line, opposite the radial tail
            let diameter = 1.0 / (PI / (2 * n) as f32).sin();
            for last in [n, 2 * n] {
                let name = format!("DEF-ring_radius.{:03}", last);
                let tail = plan.bone(&name).unwrap().transform.tail;
                assert!(tail.abs_diff_eq(Vec3::new(1.0 - diameter, 0.0, 1.0), 1e-4), "{name}: {tail}");
            }
        }
    }

    #[test]
    fn test_wings_chain_from_radial_bone() {
        let plan = plan_with(with_elements(2));
        assert_eq!(plan.final_parent("DEF-ring_radius.001"), Some("ORG-ring_radius"));
        assert_eq!(plan.final_parent("DEF-ring_radius.002"), Some("DEF-ring_radius.001"));
        assert_eq!(plan.final_parent("DEF-ring_radius.003"), Some("ORG-ring_radius"));
        assert_eq!(plan.final_parent("DEF-ring_radius.004"), Some("DEF-ring_radius.003"));
        assert!(plan.parents.iter().filter(|p| p.child.starts_with("DEF-")).all(|p| p.connected));
        assert!(plan.bones.iter().all(|b| b.bbone.is_default()));
    }

    #[test]
    fn test_sizing_control_scales_radial_bone() {
        let plan = plan_with(RingParams::default());
        let stack = plan.constraints_on("ORG-ring_radius");
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack[0].kind,
            ConstraintKind::CopyScale {
                target: "ring_sizer".to_string(),
                axes: AxisFlags::only(Axis::Y),
            }
        );
        let ctrl = plan.bone("ring_sizer").unwrap();
        assert_eq!(ctrl.role, RoleTag::Control);
        assert_eq!(
            ctrl.locks,
            Some(Locks::free().location(true, true, true).rotation(true, true, true).rotation_w(true))
        );
        let link = plan.parents.iter().find(|p| p.child == "ring_sizer").unwrap();
        assert_eq!(link.inherit_scale, Some(false));
    }

    #[test]
    fn test_ring_without_sizing_bone() {
        let plan = plan_with(RingParams {
            sizing_bone: None,
            ..Default::default()
        });
        assert_eq!(plan.count(RoleTag::Control), 0);
        assert!(plan.constraints.is_empty());
    }

    #[test]
    fn test_missing_sizing_bone_is_structural() {
        let metarig = sample(RIG_TYPE);
        let params = RingParams {
            sizing_bone: Some("nope".to_string()),
            ..Default::default()
        };
        let err = RingRig::new(&metarig.armature, "ring_radius", params).unwrap_err();
        assert!(matches!(err, GuideError::MissingGuide { role: "sizing", .. }));
    }
}
