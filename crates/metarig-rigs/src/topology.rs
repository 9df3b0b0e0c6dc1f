//! Guide topology classification.

use metarig_spec::strip_role_prefix;

use crate::error::SkeletonResult;
use crate::skeleton::SkeletonView;

/// Name prefixes that mark a child as a designated control guide.
pub const CONTROL_PREFIXES: [&str; 3] = ["CON", "CTR", "CTL"];

/// Direct children of a rig's root guide, partitioned by connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideTopology {
    pub root: String,
    pub connected: Vec<String>,
    pub unconnected: Vec<String>,
    /// First child matching a control prefix, removed from `connected`.
    pub control: Option<String>,
}

/// True if `name`, without its role prefix, starts with one of `prefixes`
/// (case-insensitive).
pub fn is_control_guide(name: &str, prefixes: &[&str]) -> bool {
    let stem = strip_role_prefix(name).to_ascii_uppercase();
    prefixes
        .iter()
        .any(|p| stem.starts_with(&p.to_ascii_uppercase()))
}

/// Classifies the children of `root`.
///
/// Pass an empty `control_prefixes` for variants without a control-naming
/// convention.
pub fn classify(
    view: &dyn SkeletonView,
    root: &str,
    control_prefixes: &[&str],
) -> SkeletonResult<GuideTopology> {
    let mut topology = GuideTopology {
        root: root.to_string(),
        ..Default::default()
    };
    for child in view.children(root)? {
        if child.connected {
            topology.connected.push(child.name);
        } else {
            topology.unconnected.push(child.name);
        }
    }
    if !control_prefixes.is_empty() {
        if let Some(pos) = topology
            .connected
            .iter()
            .position(|c| is_control_guide(c, control_prefixes))
        {
            topology.control = Some(topology.connected.remove(pos));
        }
    }
    Ok(topology)
}

/// Names of the chain of connected descendants below `root`.
///
/// The chain continues only while a bone has exactly one connected child.
pub fn connected_chain(view: &dyn SkeletonView, root: &str) -> SkeletonResult<Vec<String>> {
    let mut chain = Vec::new();
    let mut current = root.to_string();
    loop {
        let connected: Vec<_> = view
            .children(&current)?
            .into_iter()
            .filter(|c| c.connected)
            .collect();
        match connected.as_slice() {
            [only] => {
                if chain.contains(&only.name) || only.name == root {
                    break;
                }
                chain.push(only.name.clone());
                current = only.name.clone();
            }
            _ => break,
        }
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armature::{Armature, BoneRecord};
    use glam::Vec3;
    use pretty_assertions::assert_eq;

    fn dome() -> Armature {
        Armature::from_bones([
            BoneRecord::new("dome", Vec3::ZERO, Vec3::Z),
            BoneRecord::new("top", Vec3::Z, Vec3::Z * 2.0)
                .parent("dome")
                .connected(),
            BoneRecord::new("CTRL_dome", Vec3::Z, Vec3::Z * 1.5)
                .parent("dome")
                .connected(),
            BoneRecord::new("border.L", Vec3::X, Vec3::new(1.0, 0.0, 1.0)).parent("dome"),
            BoneRecord::new("border.R", -Vec3::X, Vec3::new(-1.0, 0.0, 1.0)).parent("dome"),
        ])
        .unwrap()
    }

    #[test]
    fn test_classify_partitions_children() {
        let arm = dome();
        let topology = classify(&arm, "dome", &[]).unwrap();
        assert_eq!(topology.connected, vec!["top", "CTRL_dome"]);
        assert_eq!(topology.unconnected, vec!["border.L", "border.R"]);
        assert_eq!(topology.control, None);
    }

    #[test]
    fn test_classify_extracts_control_guide() {
        let arm = dome();
        let topology = classify(&arm, "dome", &CONTROL_PREFIXES).unwrap();
        assert_eq!(topology.connected, vec!["top"]);
        assert_eq!(topology.control.as_deref(), Some("CTRL_dome"));
    }

    #[test]
    fn test_control_prefix_ignores_role_and_case() {
        assert!(is_control_guide("ORG-ctl_lip", &CONTROL_PREFIXES));
        assert!(is_control_guide("Con.L", &CONTROL_PREFIXES));
        assert!(!is_control_guide("cone", &["CTR"]));
        assert!(!is_control_guide("lip", &CONTROL_PREFIXES));
    }

    #[test]
    fn test_connected_chain_stops_at_fork() {
        let arm = Armature::from_bones([
            BoneRecord::new("a", Vec3::ZERO, Vec3::Z),
            BoneRecord::new("b", Vec3::Z, Vec3::Z * 2.0).parent("a").connected(),
            BoneRecord::new("c1", Vec3::Z * 2.0, Vec3::Z * 3.0).parent("b").connected(),
            BoneRecord::new("c2", Vec3::Z * 2.0, Vec3::X).parent("b").connected(),
        ])
        .unwrap();
        assert_eq!(connected_chain(&arm, "a").unwrap(), vec!["b"]);
        assert!(connected_chain(&arm, "c1").unwrap().is_empty());
    }
}
