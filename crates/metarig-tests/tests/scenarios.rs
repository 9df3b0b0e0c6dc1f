//! Worked generation and import scenarios.

use approx::assert_abs_diff_eq;
use metarig_porter::{apply_pose, apply_weights, parse_weights, MeshWeights, PoseDocument};
use metarig_rigs::samples::sample;
use metarig_rigs::{generate, SkeletonView};
use metarig_spec::{ConstraintParam, ParamValue, RigType, RoleTag, Vec3};
use metarig_tests::ring_metarig;
use pretty_assertions::assert_eq;

#[test]
fn stretch_chain_subdivides_the_shaft() {
    let rig = generate(&sample(RigType::SuperTemplate)).unwrap();
    let report = &rig.reports[0];

    assert_eq!(
        report.names(RoleTag::Mechanism),
        vec!["MCH-shaft.000", "MCH-shaft.001", "MCH-shaft.002"]
    );
    for (i, name) in report.names(RoleTag::Mechanism).iter().enumerate() {
        let t = rig.armature.transform(name).unwrap();
        assert_abs_diff_eq!(t.length(), 1.0, epsilon = 1e-5);
        assert!(t.head.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0 + i as f32), 1e-5));
    }

    let tweaks = report.names(RoleTag::Tweak);
    assert_eq!(tweaks.len(), 2);
    for (tweak, z) in tweaks.iter().zip([2.0, 3.0]) {
        let head = rig.armature.transform(tweak).unwrap().head;
        assert!(head.abs_diff_eq(Vec3::new(0.0, 0.0, z), 1e-5), "{tweak}: {head}");
    }

    let stretch = &rig.armature.bone("ORG-shaft").unwrap().constraints[0];
    assert_eq!(stretch.kind, "stretch_to");
    assert_eq!(stretch.target(), Some("ORG-guide_out"));
}

#[test]
fn stretch_chain_deforms_are_bendy() {
    let rig = generate(&sample(RigType::SuperTemplate)).unwrap();
    for name in ["DEF-shaft.000", "DEF-shaft.001", "DEF-shaft.002"] {
        assert_eq!(rig.armature.bbone(name).unwrap().segments, 5, "{name}");
    }
}

#[test]
fn ring_first_element_turns_ninety_plus_half_step() {
    let rig = generate(&ring_metarig(3)).unwrap();
    let report = &rig.reports[0];
    assert_eq!(report.names(RoleTag::Deform).len(), 6);

    let first = rig.armature.transform("DEF-ring.001").unwrap();
    let radial = rig.armature.transform("ORG-ring").unwrap();
    assert!(first.head.abs_diff_eq(radial.tail, 1e-6));
    // 90° + 30° about the radial bone's local X axis
    let angle = radial.vector().angle_between(first.vector());
    assert_abs_diff_eq!(angle, 120f32.to_radians(), epsilon = 1e-5);
    assert!(first.tail.abs_diff_eq(Vec3::new(0.5, 0.0, 1.0 + 0.75f32.sqrt()), 1e-5));

    let scale = &rig.armature.bone("ORG-ring").unwrap().constraints[0];
    assert_eq!(scale.kind, "copy_scale");
    assert_eq!(scale.target(), Some("ring_sizer"));
    assert_eq!(scale.get(ConstraintParam::UseX), Some(&ParamValue::Flag(false)));
    assert_eq!(scale.get(ConstraintParam::UseY), Some(&ParamValue::Flag(true)));
    assert_eq!(scale.get(ConstraintParam::UseZ), Some(&ParamValue::Flag(false)));
}

#[test]
fn ring_sizing_control_only_scales() {
    let rig = generate(&ring_metarig(3)).unwrap();
    let sizer = rig.armature.bone("ring_sizer").unwrap();
    assert!(sizer.locks.location.iter().all(|l| *l));
    assert!(sizer.locks.rotation.iter().all(|l| *l));
    assert!(sizer.locks.scale.iter().all(|l| !*l));
    assert!(!sizer.inherit_scale);
}

#[test]
fn organic_chain_sample_tiers() {
    let rig = generate(&sample(RigType::SuperLabia)).unwrap();
    let counts = rig.reports[0].tier_counts();
    assert_eq!(counts[&RoleTag::Deform], 5);
    assert_eq!(rig.reports[0].root, "ORG-pelvis");
    for def in rig.reports[0].names(RoleTag::Deform) {
        assert_eq!(rig.armature.bbone(def).unwrap().segments, 10, "{def}");
    }
}

#[test]
fn weight_import_creates_unknown_groups() {
    let mut mesh = MeshWeights::new(5);
    let document =
        parse_weights(r#"{"DEF-ring.001": {"0": 1.0, "4": 0.25}, "DEF-new_group": {"2": 0.5}}"#)
            .unwrap();
    let summary = apply_weights(&mut mesh, &document).unwrap();
    assert_eq!(summary.created_groups, vec!["DEF-new_group", "DEF-ring.001"]);
    assert_eq!(mesh.weight("DEF-new_group", 2), Some(0.5));
    assert_eq!(mesh.weight("DEF-ring.001", 4), Some(0.25));
}

#[test]
fn pose_import_skips_unknown_bones() {
    let mut rig = generate(&ring_metarig(2)).unwrap();
    let mut document = PoseDocument::new();
    let scaled = glam::Mat4::from_scale(Vec3::new(1.0, 2.0, 1.0));
    document.insert("ring_sizer".to_string(), scaled.transpose().to_cols_array());
    document.insert("no_such_bone".to_string(), glam::Mat4::IDENTITY.to_cols_array());

    let summary = apply_pose(&mut rig.armature, &document);
    assert_eq!(summary.applied, vec!["ring_sizer"]);
    assert_eq!(summary.skipped, vec!["no_such_bone"]);
    assert_eq!(rig.armature.pose("ring_sizer").unwrap(), scaled);
    assert!(!rig.armature.contains("no_such_bone"));
}

#[test]
fn every_sample_reports_its_tweak_tier() {
    for (rig_type, tweaks) in [
        (RigType::SuperTemplate, 2),
        (RigType::SuperDome, 3),
        (RigType::SuperBulge, 4),
        (RigType::SuperRing, 0),
        (RigType::SuperLabia, 4),
    ] {
        let rig = generate(&sample(rig_type)).unwrap();
        let counts = rig.reports[0].tier_counts();
        assert_eq!(counts.get(&RoleTag::Tweak).copied().unwrap_or(0), tweaks, "{rig_type}");
    }

    let rig = generate(&sample(RigType::SuperLabia)).unwrap();
    assert_eq!(
        rig.reports[0].names(RoleTag::Tweak),
        vec!["lip.001.L", "lip.002.L", "lip.003.L", "lip.004.L"]
    );
    assert_eq!(rig.reports[0].names(RoleTag::Control).len(), 3);
}
