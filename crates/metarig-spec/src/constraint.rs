//! Deferred constraint requests.
//!
//! A [`ConstraintSpec`] is planned by a rig variant and applied once, after
//! every bone it mentions exists. Each kind carries only the fields that kind
//! means something for; hosts decide which of them they can actually set.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bone::Axis;

/// Coordinate space a constraint evaluates its owner or target in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    #[default]
    World,
    Pose,
    Local,
}

impl Space {
    pub fn as_str(&self) -> &'static str {
        match self {
            Space::World => "world",
            Space::Pose => "pose",
            Space::Local => "local",
        }
    }
}

/// Per-axis enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for AxisFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl AxisFlags {
    pub fn all() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
        }
    }

    /// Only `axis` enabled.
    pub fn only(axis: Axis) -> Self {
        Self {
            x: axis == Axis::X,
            y: axis == Axis::Y,
            z: axis == Axis::Z,
        }
    }
}

/// Angular range in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    /// A range that pins rotation at zero.
    pub fn locked() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

/// Constraint kind with its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Points and stretches the owner at the target.
    StretchTo { target: String },
    /// Copies the target's scale on the enabled axes.
    CopyScale { target: String, axes: AxisFlags },
    /// Copies the target's rotation on the enabled axes.
    CopyRotation {
        target: String,
        axes: AxisFlags,
        #[serde(default)]
        use_offset: bool,
    },
    /// Copies the target's location.
    CopyLocation { target: String },
    /// Copies the target's full transform.
    CopyTransforms { target: String },
    /// Clamps rotation per axis; `None` leaves that axis free.
    LimitRotation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<AngleRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<AngleRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<AngleRange>,
    },
    /// Custom start/end handle bones for a bendy bone.
    BendyHandles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<String>,
    },
}

impl ConstraintKind {
    /// Snake-case kind name.
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::StretchTo { .. } => "stretch_to",
            ConstraintKind::CopyScale { .. } => "copy_scale",
            ConstraintKind::CopyRotation { .. } => "copy_rotation",
            ConstraintKind::CopyLocation { .. } => "copy_location",
            ConstraintKind::CopyTransforms { .. } => "copy_transforms",
            ConstraintKind::LimitRotation { .. } => "limit_rotation",
            ConstraintKind::BendyHandles { .. } => "bendy_handles",
        }
    }

    /// Every bone this constraint reads from.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            ConstraintKind::StretchTo { target }
            | ConstraintKind::CopyScale { target, .. }
            | ConstraintKind::CopyRotation { target, .. }
            | ConstraintKind::CopyLocation { target }
            | ConstraintKind::CopyTransforms { target } => vec![target.as_str()],
            ConstraintKind::LimitRotation { .. } => Vec::new(),
            ConstraintKind::BendyHandles { start, end } => {
                start.iter().chain(end.iter()).map(String::as_str).collect()
            }
        }
    }

    /// Rewrites every target name through `rename`.
    pub fn map_targets(&mut self, mut rename: impl FnMut(&str) -> String) {
        match self {
            ConstraintKind::StretchTo { target }
            | ConstraintKind::CopyScale { target, .. }
            | ConstraintKind::CopyRotation { target, .. }
            | ConstraintKind::CopyLocation { target }
            | ConstraintKind::CopyTransforms { target } => *target = rename(target),
            ConstraintKind::LimitRotation { .. } => {}
            ConstraintKind::BendyHandles { start, end } => {
                if let Some(s) = start {
                    *s = rename(s);
                }
                if let Some(e) = end {
                    *e = rename(e);
                }
            }
        }
    }

    /// Flattens the kind-specific fields into named parameters.
    pub fn params(&self) -> Vec<(ConstraintParam, ParamValue)> {
        use ConstraintParam as P;
        let mut out = Vec::new();
        match self {
            ConstraintKind::StretchTo { target }
            | ConstraintKind::CopyLocation { target }
            | ConstraintKind::CopyTransforms { target } => {
                out.push((P::Subtarget, ParamValue::Bone(target.clone())));
            }
            ConstraintKind::CopyScale { target, axes } => {
                out.push((P::Subtarget, ParamValue::Bone(target.clone())));
                push_axes(&mut out, axes);
            }
            ConstraintKind::CopyRotation {
                target,
                axes,
                use_offset,
            } => {
                out.push((P::Subtarget, ParamValue::Bone(target.clone())));
                push_axes(&mut out, axes);
                out.push((P::UseOffset, ParamValue::Flag(*use_offset)));
            }
            ConstraintKind::LimitRotation { x, y, z } => {
                let ranges = [
                    (P::UseLimitX, P::MinX, P::MaxX, x),
                    (P::UseLimitY, P::MinY, P::MaxY, y),
                    (P::UseLimitZ, P::MinZ, P::MaxZ, z),
                ];
                for (use_limit, min, max, range) in ranges {
                    out.push((use_limit, ParamValue::Flag(range.is_some())));
                    if let Some(r) = range {
                        out.push((min, ParamValue::Float(r.min)));
                        out.push((max, ParamValue::Float(r.max)));
                    }
                }
            }
            ConstraintKind::BendyHandles { start, end } => {
                if let Some(s) = start {
                    out.push((P::HandleStart, ParamValue::Bone(s.clone())));
                }
                if let Some(e) = end {
                    out.push((P::HandleEnd, ParamValue::Bone(e.clone())));
                }
            }
        }
        out
    }
}

fn push_axes(out: &mut Vec<(ConstraintParam, ParamValue)>, axes: &AxisFlags) {
    out.push((ConstraintParam::UseX, ParamValue::Flag(axes.x)));
    out.push((ConstraintParam::UseY, ParamValue::Flag(axes.y)));
    out.push((ConstraintParam::UseZ, ParamValue::Flag(axes.z)));
}

/// Named constraint parameter, as a host would see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintParam {
    Subtarget,
    UseX,
    UseY,
    UseZ,
    UseOffset,
    UseLimitX,
    UseLimitY,
    UseLimitZ,
    MinX,
    MaxX,
    MinY,
    MaxY,
    MinZ,
    MaxZ,
    HandleStart,
    HandleEnd,
    Influence,
    OwnerSpace,
    TargetSpace,
}

impl fmt::Display for ConstraintParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        write!(f, "{}", s)
    }
}

/// Value of a constraint parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Flag(bool),
    Float(f32),
    Bone(String),
    Space(Space),
}

fn default_influence() -> f32 {
    1.0
}

/// A constraint request on one owner bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub owner: String,
    #[serde(flatten)]
    pub kind: ConstraintKind,
    #[serde(default = "default_influence")]
    pub influence: f32,
    #[serde(default)]
    pub owner_space: Space,
    #[serde(default)]
    pub target_space: Space,
}

impl ConstraintSpec {
    /// Creates a full-influence world-space constraint.
    pub fn new(owner: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            owner: owner.into(),
            kind,
            influence: default_influence(),
            owner_space: Space::World,
            target_space: Space::World,
        }
    }

    pub fn stretch_to(owner: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            owner,
            ConstraintKind::StretchTo {
                target: target.into(),
            },
        )
    }

    pub fn copy_scale(owner: impl Into<String>, target: impl Into<String>, axes: AxisFlags) -> Self {
        Self::new(
            owner,
            ConstraintKind::CopyScale {
                target: target.into(),
                axes,
            },
        )
    }

    pub fn copy_rotation(owner: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            owner,
            ConstraintKind::CopyRotation {
                target: target.into(),
                axes: AxisFlags::all(),
                use_offset: false,
            },
        )
    }

    pub fn copy_location(owner: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            owner,
            ConstraintKind::CopyLocation {
                target: target.into(),
            },
        )
    }

    pub fn copy_transforms(owner: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            owner,
            ConstraintKind::CopyTransforms {
                target: target.into(),
            },
        )
    }

    /// Limit-rotation pinning local Z rotation at zero.
    pub fn lock_z_rotation(owner: impl Into<String>) -> Self {
        Self::new(
            owner,
            ConstraintKind::LimitRotation {
                x: None,
                y: None,
                z: Some(AngleRange::locked()),
            },
        )
        .owner_space(Space::Local)
    }

    pub fn bendy_handles(
        owner: impl Into<String>,
        start: Option<String>,
        end: Option<String>,
    ) -> Self {
        Self::new(owner, ConstraintKind::BendyHandles { start, end })
    }

    pub fn influence(mut self, influence: f32) -> Self {
        self.influence = influence;
        self
    }

    pub fn owner_space(mut self, space: Space) -> Self {
        self.owner_space = space;
        self
    }

    pub fn target_space(mut self, space: Space) -> Self {
        self.target_space = space;
        self
    }

    /// Sets owner and target space together.
    pub fn spaces(self, space: Space) -> Self {
        self.owner_space(space).target_space(space)
    }

    /// Every named parameter this spec carries, including influence and spaces.
    pub fn params(&self) -> Vec<(ConstraintParam, ParamValue)> {
        let mut out = self.kind.params();
        out.push((ConstraintParam::Influence, ParamValue::Float(self.influence)));
        out.push((ConstraintParam::OwnerSpace, ParamValue::Space(self.owner_space)));
        out.push((ConstraintParam::TargetSpace, ParamValue::Space(self.target_space)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_limit_rotation_params_only_list_limited_axes() {
        let spec = ConstraintSpec::lock_z_rotation("MCH-rim");
        let params = spec.params();
        assert!(params.contains(&(ConstraintParam::UseLimitX, ParamValue::Flag(false))));
        assert!(params.contains(&(ConstraintParam::UseLimitZ, ParamValue::Flag(true))));
        assert!(params.contains(&(ConstraintParam::MinZ, ParamValue::Float(0.0))));
        assert!(!params.iter().any(|(p, _)| *p == ConstraintParam::MinX));
        assert!(params.contains(&(ConstraintParam::OwnerSpace, ParamValue::Space(Space::Local))));
    }

    #[test]
    fn test_copy_scale_y_only() {
        let spec = ConstraintSpec::copy_scale("ORG-ring", "ring_sizer", AxisFlags::only(Axis::Y));
        let params = spec.kind.params();
        assert_eq!(
            params,
            vec![
                (ConstraintParam::Subtarget, ParamValue::Bone("ring_sizer".into())),
                (ConstraintParam::UseX, ParamValue::Flag(false)),
                (ConstraintParam::UseY, ParamValue::Flag(true)),
                (ConstraintParam::UseZ, ParamValue::Flag(false)),
            ]
        );
    }

    #[test]
    fn test_map_targets_renames_handles() {
        let mut kind = ConstraintKind::BendyHandles {
            start: Some("a".into()),
            end: None,
        };
        kind.map_targets(|n| format!("{}.001", n));
        assert_eq!(kind.targets(), vec!["a.001"]);
    }

    #[test]
    fn test_spec_json_shape() {
        let spec = ConstraintSpec::stretch_to("ORG-shaft", "ORG-guide_out");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "stretch_to");
        assert_eq!(json["target"], "ORG-guide_out");
        assert_eq!(json["owner_space"], "world");

        let back: ConstraintSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_param_display() {
        assert_eq!(ConstraintParam::HandleStart.to_string(), "handle_start");
    }
}
