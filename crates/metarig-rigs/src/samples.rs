//! Minimal valid metarigs, one per rig variant.

use glam::Vec3;
use metarig_spec::{RigParams, RigType};

use crate::armature::{Armature, BoneRecord};
use crate::metarig::Metarig;

fn v(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

fn build(bones: Vec<BoneRecord>, bone: &str, rig_type: RigType) -> Metarig {
    let armature = Armature::from_bones(bones).expect("sample bones are listed parents first");
    Metarig::new(armature).assign(bone, RigParams::defaults(rig_type))
}

/// Bone the sample of `rig_type` assigns its rig to.
pub fn sample_bone(rig_type: RigType) -> &'static str {
    match rig_type {
        RigType::SuperTemplate => "shaft",
        RigType::SuperDome | RigType::SuperBulge => "dome",
        RigType::SuperRing => "ring_radius",
        RigType::SuperLabia => "lip.L",
    }
}

/// A metarig with one rig of `rig_type` and its default parameters.
pub fn sample(rig_type: RigType) -> Metarig {
    let bone = sample_bone(rig_type);
    let bones = match rig_type {
        RigType::SuperTemplate => vec![
            BoneRecord::new("guide_in", v(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)),
            BoneRecord::new("shaft", v(0.0, 0.0, 1.0), v(0.0, 0.0, 4.0))
                .parent("guide_in")
                .connected(),
            BoneRecord::new("guide_out", v(0.0, 0.0, 4.0), v(0.0, 0.0, 5.0))
                .parent("shaft")
                .connected(),
        ],
        RigType::SuperDome => dome_bones(&[
            ("rim.L", v(1.0, 0.0, 1.0), v(1.5, 0.0, 1.5)),
            ("rim.R", v(-1.0, 0.0, 1.0), v(-1.5, 0.0, 1.5)),
        ]),
        RigType::SuperBulge => dome_bones(&[
            ("border.001", v(2.0, 0.0, 1.0), v(2.0, 0.0, 2.0)),
            ("border.002", v(0.0, 2.0, 1.0), v(0.0, 2.0, 2.0)),
            ("border.003", v(-2.0, 0.0, 1.0), v(-2.0, 0.0, 2.0)),
        ]),
        RigType::SuperRing => vec![
            BoneRecord::new("ring_radius", v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0)),
            BoneRecord::new("ring_sizer", v(0.0, 0.0, 1.0), v(0.0, 0.0, 2.0)).parent("ring_radius"),
        ],
        RigType::SuperLabia => {
            let points = [
                v(0.0, 0.0, 0.0),
                v(0.0, 0.5, 1.0),
                v(0.0, 0.7, 2.0),
                v(0.0, 0.7, 3.0),
                v(0.0, 0.5, 4.0),
                v(0.0, 0.0, 5.0),
            ];
            let names = ["lip.L", "lip.001.L", "lip.002.L", "lip.003.L", "lip.004.L"];
            let mut bones = vec![BoneRecord::new("pelvis", v(0.0, 0.0, -1.0), v(0.0, 0.0, 0.0))];
            for (i, name) in names.iter().enumerate() {
                let bone = BoneRecord::new(*name, points[i], points[i + 1]);
                bones.push(match i {
                    0 => bone.parent("pelvis"),
                    _ => bone.parent(names[i - 1]).connected(),
                });
            }
            bones
        }
    };
    build(bones, bone, rig_type)
}

/// Base, dome, a connected top and the given unconnected borders.
fn dome_bones(borders: &[(&str, Vec3, Vec3)]) -> Vec<BoneRecord> {
    let mut bones = vec![
        BoneRecord::new("base", v(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)),
        BoneRecord::new("dome", v(0.0, 0.0, 1.0), v(0.0, 0.0, 4.0)).parent("base"),
        BoneRecord::new("top", v(0.0, 0.0, 4.0), v(0.0, 0.0, 5.0))
            .parent("dome")
            .connected(),
    ];
    bones.extend(
        borders
            .iter()
            .map(|(name, head, tail)| BoneRecord::new(*name, *head, *tail).parent("dome")),
    );
    bones
}
