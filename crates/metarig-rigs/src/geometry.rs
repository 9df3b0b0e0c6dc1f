//! Geometry helpers shared by the rig variants.
//!
//! Alignment never fails loudly: a degenerate target vector leaves the bone
//! untouched and returns `false`, so callers that care substitute a fallback.

use glam::{Quat, Vec3};
use metarig_spec::{Axis, BoneTransform};

/// Relative magnitude below which an outward vector is unusable.
pub const MIN_AXIS_RATIO: f32 = 1e-3;

/// Rotates `vector` by `angle` radians around `axis` (right-handed).
///
/// A zero axis leaves the vector unchanged.
pub fn rotate_around_axis(vector: Vec3, angle: f32, axis: Vec3) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle) * vector,
        None => vector,
    }
}

/// Makes a bone's local `axis` point along `vector`.
///
/// Y re-points the bone keeping head and length; X and Z change only the
/// roll. Returns `false` and leaves the bone unchanged when `vector` is
/// degenerate or, for X and Z, parallel to the bone.
pub fn align_axis(bone: &mut BoneTransform, axis: Axis, vector: Vec3) -> bool {
    match axis {
        Axis::Y => bone.point_along(vector),
        Axis::X | Axis::Z => match bone.roll_towards(axis, vector) {
            Some(roll) => {
                bone.roll = roll;
                true
            }
            None => false,
        },
    }
}

/// Rolls a bone so its local Z axis points along `vector`.
pub fn align_roll(bone: &mut BoneTransform, vector: Vec3) -> bool {
    align_axis(bone, Axis::Z, vector)
}

/// Points a bone along a world axis with the given length, keeping the head.
pub fn orient_along_world(bone: &mut BoneTransform, axis: Axis, length: f32) {
    bone.tail = bone.head + axis.unit() * length;
}

/// Unit vector from the head of `first` to the tail of `last`.
///
/// Falls back to the direction of `first` for a closed chain.
pub fn chain_direction(first: &BoneTransform, last: &BoneTransform) -> Vec3 {
    (last.tail - first.head)
        .try_normalize()
        .unwrap_or_else(|| first.direction())
}

/// Vector coplanar with `first` and the chain direction, pointing out of the chain.
///
/// This is `first.y - proj(first.y, chain_dir)`. When the chain is straight
/// that vector vanishes and `first`'s local X axis is returned instead.
pub fn outward_vector(first: &BoneTransform, chain_dir: Vec3) -> Vec3 {
    let y = first.y_axis();
    let dir = chain_dir.try_normalize().unwrap_or(y);
    let outward = y - dir * y.dot(dir);
    if outward.length() < y.length() * MIN_AXIS_RATIO {
        first.x_axis()
    } else {
        outward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_rotate_around_axis_right_handed() {
        assert_vec(rotate_around_axis(Vec3::X, FRAC_PI_2, Vec3::Z), Vec3::Y);
        assert_vec(rotate_around_axis(Vec3::X, FRAC_PI_2, Vec3::Z * 3.0), Vec3::Y);
        assert_vec(rotate_around_axis(Vec3::X, 1.0, Vec3::ZERO), Vec3::X);
    }

    #[test]
    fn test_align_y_keeps_length() {
        let mut bone = BoneTransform::new(Vec3::ZERO, Vec3::Z * 2.0);
        assert!(align_axis(&mut bone, Axis::Y, Vec3::X * 0.1));
        assert_vec(bone.tail, Vec3::X * 2.0);
    }

    #[test]
    fn test_align_z_rolls_bone() {
        let mut bone = BoneTransform::new(Vec3::ZERO, Vec3::Y);
        assert!(align_roll(&mut bone, Vec3::X));
        assert_vec(bone.z_axis(), Vec3::X);
        assert_vec(bone.tail, Vec3::Y);
    }

    #[test]
    fn test_degenerate_alignment_is_silent() {
        let mut bone = BoneTransform::new(Vec3::ZERO, Vec3::Y).with_roll(0.3);
        assert!(!align_axis(&mut bone, Axis::X, Vec3::ZERO));
        assert!(!align_axis(&mut bone, Axis::Z, Vec3::Y * 5.0));
        assert!(!align_axis(&mut bone, Axis::Y, Vec3::ZERO));
        assert_abs_diff_eq!(bone.roll, 0.3);
        assert_vec(bone.tail, Vec3::Y);
    }

    #[test]
    fn test_outward_vector_of_bent_chain() {
        let first = BoneTransform::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        let last = BoneTransform::new(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 2.0));
        let dir = chain_direction(&first, &last);
        assert_vec(dir, Vec3::Z);
        let out = outward_vector(&first, dir);
        assert_abs_diff_eq!(out.dot(dir), 0.0, epsilon = 1e-6);
        assert!(out.y > 0.0);
    }

    #[test]
    fn test_outward_vector_falls_back_on_straight_chain() {
        let first = BoneTransform::new(Vec3::ZERO, Vec3::Z);
        let out = outward_vector(&first, Vec3::Z);
        assert_vec(out, first.x_axis());
    }
}
