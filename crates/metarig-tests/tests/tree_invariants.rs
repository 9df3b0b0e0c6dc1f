//! Structural invariants of generated rigs.
//!
//! Every rig instance must form a single tree under its root, and deform
//! bones must never parent bones of another tier.

use metarig_rigs::samples::sample;
use metarig_rigs::{generate, Armature, SkeletonOp, SkeletonView};
use metarig_spec::{OrganicChainParams, RigType, SingleBoneAnchor, StretchChainParams, Vec3};
use metarig_tests::{
    deform_parents, organic_chain_metarig, ring_metarig, stretch_chain_metarig, unrooted_bones,
};
use pretty_assertions::assert_eq;

#[test]
fn every_sample_forms_a_tree() {
    for rig_type in RigType::ALL {
        let rig = generate(&sample(rig_type)).unwrap();
        for report in &rig.reports {
            assert!(rig.armature.contains(&report.root), "{rig_type}: missing root");
            assert_eq!(unrooted_bones(&rig.armature, report), Vec::<String>::new(), "{rig_type}");
        }
    }
}

#[test]
fn deform_bones_are_leaf_tier() {
    for rig_type in RigType::ALL {
        let rig = generate(&sample(rig_type)).unwrap();
        assert_eq!(deform_parents(&rig.armature), Vec::<(String, String)>::new(), "{rig_type}");
    }
}

#[test]
fn every_created_bone_has_a_parent() {
    for rig_type in RigType::ALL {
        let rig = generate(&sample(rig_type)).unwrap();
        let report = &rig.reports[0];
        for (name, _) in &report.bones {
            if *name == report.root {
                continue;
            }
            assert!(
                rig.armature.parent(name).unwrap().is_some(),
                "{rig_type}: '{name}' is an orphan"
            );
        }
    }
}

#[test]
fn single_bone_organic_chain_stays_rooted() {
    let points = [Vec3::ZERO, Vec3::new(0.0, 0.5, 1.0)];
    let rig = generate(&organic_chain_metarig(&points, OrganicChainParams::default())).unwrap();
    assert_eq!(unrooted_bones(&rig.armature, &rig.reports[0]), Vec::<String>::new());

    // the detached layout leaves the chain-end controls as their own roots
    let detached = OrganicChainParams {
        single_bone_anchor: SingleBoneAnchor::Detached,
        ..Default::default()
    };
    let rig = generate(&organic_chain_metarig(&points, detached)).unwrap();
    assert!(!unrooted_bones(&rig.armature, &rig.reports[0]).is_empty());
}

#[test]
fn stacked_rigs_share_one_armature() {
    // a ring stacked on the end of a stretch chain
    let mut metarig = sample(RigType::SuperTemplate);
    let ring = ring_metarig(2);
    for bone in ring.armature.bones() {
        let mut bone = bone.clone();
        if bone.parent.is_none() {
            bone.parent = Some("guide_out".to_string());
        }
        metarig.armature.insert(bone).unwrap();
    }
    metarig.rigs.extend(ring.rigs);

    let rig = generate(&metarig).unwrap();
    assert_eq!(rig.reports.len(), 2);
    for report in &rig.reports {
        assert_eq!(unrooted_bones(&rig.armature, report), Vec::<String>::new());
    }
    assert!(rig.armature.is_ancestor("ORG-guide_out", "DEF-ring.004"));
}

#[test]
fn wrong_chain_length_is_rejected_without_mutation() {
    for count in [1, 2, 4, 5] {
        let metarig = stretch_chain_metarig(count, StretchChainParams::default());
        let mut target = Armature::new();
        let err = metarig_rigs::generate_into(&metarig, &mut target).unwrap_err();
        assert!(err.is_structural(), "{count} guides");
        assert_eq!(err.code(), "G001");
        assert_eq!(target.op_count(SkeletonOp::CreateBone), 0);
        assert_eq!(target.op_count(SkeletonOp::SetParent), 0);
        assert!(target.is_empty());
    }
}
