//! Metarig Integration Test Infrastructure
//!
//! Helpers shared by the cross-crate tests:
//!
//! - **Fixtures**: metarigs with a variable number of guides, for the
//!   property tests and the topology rejection checks
//! - **Checks**: the tree and role-tier invariants evaluated on a generated
//!   armature
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p metarig-tests
//! ```

use glam::Vec3;
use metarig_rigs::{Armature, BoneRecord, Metarig, RigReport, SkeletonView};
use metarig_spec::{
    BoneName, OrganicChainParams, RigParams, RingParams, RoleTag, StretchChainParams,
};

/// A straight chain of `count` connected guides along +Z, one unit each.
///
/// The first guide is `chain`, the rest `chain.001`, `chain.002`, ...
pub fn straight_chain(count: usize) -> Armature {
    let mut armature = Armature::new();
    let mut prev: Option<String> = None;
    for i in 0..count {
        let name = match i {
            0 => "chain".to_string(),
            _ => format!("chain.{:03}", i),
        };
        let head = Vec3::new(0.0, 0.0, i as f32);
        let mut bone = BoneRecord::new(name.clone(), head, head + Vec3::Z);
        if let Some(parent) = &prev {
            bone = bone.parent(parent.clone()).connected();
        }
        armature
            .insert(bone)
            .expect("chain bones are inserted parents first");
        prev = Some(name);
    }
    armature
}

/// A stretch chain assigned to the second guide of a straight chain.
///
/// With `count == 3` this is a valid guide-in/shaft/guide-out setup.
pub fn stretch_chain_metarig(count: usize, params: StretchChainParams) -> Metarig {
    let armature = straight_chain(count);
    let bone = armature
        .bone_names()
        .get(1)
        .cloned()
        .unwrap_or_else(|| "chain".to_string());
    Metarig::new(armature).assign(bone, RigParams::SuperTemplate(params))
}

/// A radial ring with a sizing child and `wing_elements` per wing.
pub fn ring_metarig(wing_elements: u32) -> Metarig {
    let armature = Armature::from_bones([
        BoneRecord::new("ring", Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0)),
        BoneRecord::new("ring_sizer", Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 2.0))
            .parent("ring"),
    ])
    .expect("ring bones are listed parents first");
    let params = RingParams {
        wing_elements,
        ..Default::default()
    };
    Metarig::new(armature).assign("ring", RigParams::SuperRing(params))
}

/// An organic chain through `points` under a `pelvis` base bone.
///
/// Needs at least two points; consecutive points must differ.
pub fn organic_chain_metarig(points: &[Vec3], params: OrganicChainParams) -> Metarig {
    let mut armature = Armature::new();
    armature
        .insert(BoneRecord::new("pelvis", Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO))
        .expect("empty armature accepts the base bone");
    let mut prev = "pelvis".to_string();
    for (i, pair) in points.windows(2).enumerate() {
        let name = match i {
            0 => "lip.L".to_string(),
            _ => format!("lip.{:03}.L", i),
        };
        let bone = BoneRecord::new(name.clone(), pair[0], pair[1]).parent(prev.clone());
        let bone = if i == 0 { bone } else { bone.connected() };
        armature
            .insert(bone)
            .expect("chain bones are inserted parents first");
        prev = name;
    }
    Metarig::new(armature).assign("lip.L", RigParams::SuperLabia(params))
}

/// Bones of one rig instance that do not reach the instance root.
///
/// Covers every created bone and every guide `ORG-` bone except the shared
/// ones. An empty result means the instance forms a single tree.
pub fn unrooted_bones(armature: &Armature, report: &RigReport) -> Vec<String> {
    report
        .bones
        .iter()
        .map(|(name, _)| name)
        .chain(&report.guides)
        .filter(|name| !report.shared.contains(name))
        .filter(|name| !armature.is_ancestor(&report.root, name))
        .cloned()
        .collect()
}

/// `(parent, child)` pairs where a deform bone parents a non-deform bone.
pub fn deform_parents(armature: &Armature) -> Vec<(String, String)> {
    armature
        .bones()
        .iter()
        .filter_map(|bone| {
            let parent = bone.parent.as_deref()?;
            let parent_is_deform = BoneName::parse(parent).role == RoleTag::Deform;
            let child_is_deform = BoneName::parse(&bone.name).role == RoleTag::Deform;
            (parent_is_deform && !child_is_deform).then(|| (parent.to_string(), bone.name.clone()))
        })
        .collect()
}

/// Runs `generate` `runs` times and returns the distinct hashes it produced.
pub fn distinct_hashes(runs: usize, generate: impl Fn() -> String) -> Vec<String> {
    let mut hashes: Vec<String> = (0..runs).map(|_| generate()).collect();
    hashes.sort();
    hashes.dedup();
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_chain_names() {
        let chain = straight_chain(3);
        assert_eq!(chain.bone_names(), vec!["chain", "chain.001", "chain.002"]);
        assert!(chain.is_connected("chain.002").unwrap());
    }

    #[test]
    fn test_organic_chain_fixture() {
        let points = [Vec3::ZERO, Vec3::Z, Vec3::Z * 2.0, Vec3::Z * 3.0];
        let metarig = organic_chain_metarig(&points, OrganicChainParams::default());
        assert_eq!(metarig.armature.len(), 4);
        assert_eq!(
            metarig.armature.parent("lip.002.L").unwrap().as_deref(),
            Some("lip.001.L")
        );
    }
}
