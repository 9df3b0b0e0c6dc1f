//! Bone geometry: head, tail, roll and the local axes they imply.
//!
//! A bone's local Y axis runs from head to tail. X and Z are fixed by the
//! direction plus a roll angle, using the same zero-roll frame as the host's
//! armature editor so roll values round-trip unchanged.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vectors shorter than this are treated as degenerate.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

// Below this, 1 + y is too small to divide by and the x/z based expansion is used.
const SAFE_THRESHOLD: f32 = 6.1e-3;
const CRITICAL_THRESHOLD_SQUARED: f32 = 2.5e-4 * 2.5e-4;

/// A bone-local axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector of this axis in bone space.
    pub fn unit(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Index of this axis (0, 1 or 2).
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        write!(f, "{}", s)
    }
}

/// Edit-mode transform of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub head: Vec3,
    pub tail: Vec3,
    #[serde(default)]
    pub roll: f32,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            head: Vec3::ZERO,
            tail: Vec3::Y,
            roll: 0.0,
        }
    }
}

impl BoneTransform {
    /// Creates a transform with zero roll.
    pub fn new(head: Vec3, tail: Vec3) -> Self {
        Self {
            head,
            tail,
            roll: 0.0,
        }
    }

    /// Sets the roll.
    pub fn with_roll(mut self, roll: f32) -> Self {
        self.roll = roll;
        self
    }

    /// Head-to-tail vector.
    pub fn vector(&self) -> Vec3 {
        self.tail - self.head
    }

    /// Distance from head to tail.
    pub fn length(&self) -> f32 {
        self.vector().length()
    }

    /// Unit direction of the bone, or +Y for a zero-length bone.
    pub fn direction(&self) -> Vec3 {
        self.vector().try_normalize().unwrap_or(Vec3::Y)
    }

    /// Moves the tail along the bone's direction so the bone has `length`.
    pub fn set_length(&mut self, length: f32) {
        self.tail = self.head + self.direction() * length;
    }

    /// Multiplies the bone's length by `factor`, keeping head and direction.
    pub fn scale_length(&mut self, factor: f32) {
        self.set_length(self.length() * factor);
    }

    /// Translates the bone so its head sits at `head`, keeping its vector.
    pub fn move_head_to(&mut self, head: Vec3) {
        let vector = self.vector();
        self.head = head;
        self.tail = head + vector;
    }

    /// Points the bone along `vector`, keeping its head, length and roll value.
    ///
    /// Leaves the bone unchanged if `vector` is degenerate.
    pub fn point_along(&mut self, vector: Vec3) -> bool {
        match vector.try_normalize() {
            Some(dir) => {
                self.tail = self.head + dir * self.length();
                true
            }
            None => false,
        }
    }

    /// Local X, Y and Z axes in armature space.
    pub fn axes(&self) -> (Vec3, Vec3, Vec3) {
        let y = self.direction();
        let (x0, z0) = zero_roll_frame(y);
        let spin = Quat::from_axis_angle(y, self.roll);
        (spin * x0, y, spin * z0)
    }

    pub fn x_axis(&self) -> Vec3 {
        self.axes().0
    }

    pub fn y_axis(&self) -> Vec3 {
        self.axes().1
    }

    pub fn z_axis(&self) -> Vec3 {
        self.axes().2
    }

    /// Local axis by name.
    pub fn axis(&self, axis: Axis) -> Vec3 {
        let (x, y, z) = self.axes();
        match axis {
            Axis::X => x,
            Axis::Y => y,
            Axis::Z => z,
        }
    }

    /// Rotation matrix whose columns are the local axes.
    pub fn matrix(&self) -> Mat3 {
        let (x, y, z) = self.axes();
        Mat3::from_cols(x, y, z)
    }

    /// Roll that makes the local `axis` (X or Z) point as closely as possible along `target`.
    ///
    /// Returns `None` if `target` is degenerate or parallel to the bone; Y
    /// cannot be reached by rolling and also yields `None`.
    pub fn roll_towards(&self, axis: Axis, target: Vec3) -> Option<f32> {
        let nor = self.vector().try_normalize()?;
        let projected = target - nor * nor.dot(target);
        if projected.length() <= DEGENERATE_EPSILON * target.length().max(1.0) {
            return None;
        }
        let (x0, z0) = zero_roll_frame(nor);
        let reference = match axis {
            Axis::X => x0,
            Axis::Z => z0,
            Axis::Y => return None,
        };
        Some(reference.cross(projected).dot(nor).atan2(reference.dot(projected)))
    }
}

/// X and Z axes of a bone pointing along unit `nor` with zero roll.
pub fn zero_roll_frame(nor: Vec3) -> (Vec3, Vec3) {
    let (x, y, z) = (nor.x, nor.y, nor.z);
    let mut theta = 1.0 + y;
    let theta_alt = x * x + z * z;

    if theta > SAFE_THRESHOLD || theta_alt > CRITICAL_THRESHOLD_SQUARED {
        if theta <= SAFE_THRESHOLD {
            theta = theta_alt * 0.5 + theta_alt * theta_alt * 0.125;
        }
        let x_axis = Vec3::new(1.0 - x * x / theta, -x, -x * z / theta);
        let z_axis = Vec3::new(-x * z / theta, -z, 1.0 - z * z / theta);
        (x_axis, z_axis)
    } else {
        // Pointing straight down -Y.
        (Vec3::NEG_X, Vec3::Z)
    }
}

/// B-bone display and ease settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBoneShape {
    pub segments: u32,
    pub ease_in: f32,
    pub ease_out: f32,
}

impl Default for BBoneShape {
    fn default() -> Self {
        Self {
            segments: 1,
            ease_in: 1.0,
            ease_out: 1.0,
        }
    }
}

impl BBoneShape {
    /// A curved bone with `segments` segments and default ease.
    pub fn segments(segments: u32) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    /// Sets ease-in and ease-out.
    pub fn with_ease(mut self, ease_in: f32, ease_out: f32) -> Self {
        self.ease_in = ease_in;
        self.ease_out = ease_out;
        self
    }

    /// Returns true for the straight single-segment default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
