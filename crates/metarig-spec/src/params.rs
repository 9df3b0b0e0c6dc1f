//! Per-variant rig parameters.
//!
//! Every variant has one explicit parameter struct. Missing fields take the
//! documented defaults; `validate()` enforces ranges before generation starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::binding::LayerMask;
use crate::error::{GuideError, GuideResult};

/// Upper bound on bendy-bone segments a host accepts.
pub const MAX_BBONE_SEGMENTS: u32 = 32;

/// Rig variant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigType {
    /// Stretch chain with bendy handles between guide-in and guide-out.
    SuperTemplate,
    /// Radial dome with a stabilised border.
    SuperDome,
    /// Wobble bulge with bendy-handle border stabilisation.
    SuperBulge,
    /// Radial ring duplicated by angular sweep.
    SuperRing,
    /// Organic multi-bone chain with a pivot-weighted blend.
    SuperLabia,
}

impl RigType {
    /// All rig types, in declaration order.
    pub const ALL: [RigType; 5] = [
        RigType::SuperTemplate,
        RigType::SuperDome,
        RigType::SuperBulge,
        RigType::SuperRing,
        RigType::SuperLabia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RigType::SuperTemplate => "super_template",
            RigType::SuperDome => "super_dome",
            RigType::SuperBulge => "super_bulge",
            RigType::SuperRing => "super_ring",
            RigType::SuperLabia => "super_labia",
        }
    }
}

impl fmt::Display for RigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RigType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RigType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let known: Vec<&str> = RigType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown rig type '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

fn default_true() -> bool {
    true
}

fn default_bbone_elements() -> u32 {
    3
}

fn default_template_segments() -> u32 {
    5
}

fn default_bulge_segments() -> u32 {
    7
}

fn default_wing_elements() -> u32 {
    3
}

fn default_labia_bbones() -> u32 {
    10
}

fn default_tweak_layers() -> LayerMask {
    LayerMask::layer(1)
}

fn default_labia_tweak_layers() -> LayerMask {
    LayerMask::layer(20)
}

fn default_sizing_bone() -> Option<String> {
    Some("ring_sizer".to_string())
}

fn check_segments(bone: &str, param: &'static str, value: u32, min: u32) -> GuideResult<()> {
    if !(min..=MAX_BBONE_SEGMENTS).contains(&value) {
        return Err(GuideError::invalid_parameter(
            bone,
            param,
            format!("must be in {}..={}, got {}", min, MAX_BBONE_SEGMENTS, value),
        ));
    }
    Ok(())
}

fn check_bone_name(bone: &str, param: &'static str, value: &Option<String>) -> GuideResult<()> {
    if matches!(value, Some(name) if name.trim().is_empty()) {
        return Err(GuideError::invalid_parameter(
            bone,
            param,
            "bone name must not be blank",
        ));
    }
    Ok(())
}

/// Parameters of the stretch-chain variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StretchChainParams {
    /// Guide-in bone; defaults to the shaft's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_in_bone: Option<String>,
    #[serde(default = "default_true")]
    pub guide_in_deform: bool,
    #[serde(default = "default_true")]
    pub guide_in_control: bool,
    /// Expected guide-out bone; when set it must be the shaft's connected child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_out_bone: Option<String>,
    #[serde(default = "default_true")]
    pub guide_out_deform: bool,
    /// Number of mechanism segments along the shaft.
    #[serde(default = "default_bbone_elements")]
    pub bbone_elements: u32,
    /// Bendy segments per deform bone.
    #[serde(default = "default_template_segments")]
    pub bbone_segments: u32,
    #[serde(default = "default_true")]
    pub tweak_extra_layers: bool,
    #[serde(default = "default_tweak_layers")]
    pub tweak_layers: LayerMask,
}

impl Default for StretchChainParams {
    fn default() -> Self {
        Self {
            guide_in_bone: None,
            guide_in_deform: true,
            guide_in_control: true,
            guide_out_bone: None,
            guide_out_deform: true,
            bbone_elements: default_bbone_elements(),
            bbone_segments: default_template_segments(),
            tweak_extra_layers: true,
            tweak_layers: default_tweak_layers(),
        }
    }
}

impl StretchChainParams {
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        check_bone_name(bone, "guide_in_bone", &self.guide_in_bone)?;
        check_bone_name(bone, "guide_out_bone", &self.guide_out_bone)?;
        if self.bbone_elements == 0 {
            return Err(GuideError::invalid_parameter(
                bone,
                "bbone_elements",
                "must be at least 1",
            ));
        }
        check_segments(bone, "bbone_segments", self.bbone_segments, 1)
    }
}

/// Parameters of the radial dome variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomeParams {
    /// Explicit base bone; defaults to the dome's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_bone: Option<String>,
    #[serde(default = "default_true")]
    pub tweak_extra_layers: bool,
    #[serde(default = "default_tweak_layers")]
    pub tweak_layers: LayerMask,
}

impl Default for DomeParams {
    fn default() -> Self {
        Self {
            base_bone: None,
            tweak_extra_layers: true,
            tweak_layers: default_tweak_layers(),
        }
    }
}

impl DomeParams {
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        check_bone_name(bone, "base_bone", &self.base_bone)
    }
}

/// Parameters of the wobble-bulge variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulgeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_bone: Option<String>,
    /// Bendy segments on border deform bones.
    #[serde(default = "default_bulge_segments")]
    pub bbone_segments: u32,
    /// Create a Z-helper per border to stabilise roll.
    #[serde(default = "default_true")]
    pub zhelper_bones: bool,
    #[serde(default = "default_true")]
    pub tweak_extra_layers: bool,
    #[serde(default = "default_tweak_layers")]
    pub tweak_layers: LayerMask,
}

impl Default for BulgeParams {
    fn default() -> Self {
        Self {
            base_bone: None,
            bbone_segments: default_bulge_segments(),
            zhelper_bones: true,
            tweak_extra_layers: true,
            tweak_layers: default_tweak_layers(),
        }
    }
}

impl BulgeParams {
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        check_bone_name(bone, "base_bone", &self.base_bone)?;
        check_segments(bone, "bbone_segments", self.bbone_segments, 3)
    }
}

/// Parameters of the radial ring variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingParams {
    /// Sizing guide; `None` generates a ring without a sizing control.
    #[serde(default = "default_sizing_bone")]
    pub sizing_bone: Option<String>,
    /// Deform bones per wing.
    #[serde(default = "default_wing_elements")]
    pub wing_elements: u32,
}

impl Default for RingParams {
    fn default() -> Self {
        Self {
            sizing_bone: default_sizing_bone(),
            wing_elements: default_wing_elements(),
        }
    }
}

impl RingParams {
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        check_bone_name(bone, "sizing_bone", &self.sizing_bone)?;
        if self.wing_elements == 0 {
            return Err(GuideError::invalid_parameter(
                bone,
                "wing_elements",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Axis tweaks and the pivot are aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweakAxis {
    /// Outward from the chain, derived from the chain's geometry.
    #[default]
    Auto,
    X,
    Y,
    Z,
}

/// Where the end controls of a single-bone organic chain hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleBoneAnchor {
    /// Parent the end controls to the chain's base.
    #[default]
    Base,
    /// Leave the end controls without a parent.
    Detached,
}

/// Parameters of the organic chain variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganicChainParams {
    #[serde(default)]
    pub tweak_axis: TweakAxis,
    /// Bone the chain end converges onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conv_bone: Option<String>,
    /// Bendy segments per deform bone.
    #[serde(default = "default_labia_bbones")]
    pub bbones: u32,
    #[serde(default)]
    pub tweak_extra_layers: bool,
    #[serde(default = "default_labia_tweak_layers")]
    pub tweak_layers: LayerMask,
    #[serde(default)]
    pub single_bone_anchor: SingleBoneAnchor,
}

impl Default for OrganicChainParams {
    fn default() -> Self {
        Self {
            tweak_axis: TweakAxis::Auto,
            conv_bone: None,
            bbones: default_labia_bbones(),
            tweak_extra_layers: false,
            tweak_layers: default_labia_tweak_layers(),
            single_bone_anchor: SingleBoneAnchor::Base,
        }
    }
}

impl OrganicChainParams {
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        check_bone_name(bone, "conv_bone", &self.conv_bone)?;
        check_segments(bone, "bbones", self.bbones, 1)
    }
}

/// Rig parameters tagged by rig type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RigParams {
    SuperTemplate(StretchChainParams),
    SuperDome(DomeParams),
    SuperBulge(BulgeParams),
    SuperRing(RingParams),
    SuperLabia(OrganicChainParams),
}

impl RigParams {
    /// Default parameters for `rig_type`.
    pub fn defaults(rig_type: RigType) -> Self {
        match rig_type {
            RigType::SuperTemplate => RigParams::SuperTemplate(StretchChainParams::default()),
            RigType::SuperDome => RigParams::SuperDome(DomeParams::default()),
            RigType::SuperBulge => RigParams::SuperBulge(BulgeParams::default()),
            RigType::SuperRing => RigParams::SuperRing(RingParams::default()),
            RigType::SuperLabia => RigParams::SuperLabia(OrganicChainParams::default()),
        }
    }

    pub fn rig_type(&self) -> RigType {
        match self {
            RigParams::SuperTemplate(_) => RigType::SuperTemplate,
            RigParams::SuperDome(_) => RigType::SuperDome,
            RigParams::SuperBulge(_) => RigType::SuperBulge,
            RigParams::SuperRing(_) => RigType::SuperRing,
            RigParams::SuperLabia(_) => RigType::SuperLabia,
        }
    }

    /// Validates ranges for the rig assigned to `bone`.
    pub fn validate(&self, bone: &str) -> GuideResult<()> {
        match self {
            RigParams::SuperTemplate(p) => p.validate(bone),
            RigParams::SuperDome(p) => p.validate(bone),
            RigParams::SuperBulge(p) => p.validate(bone),
            RigParams::SuperRing(p) => p.validate(bone),
            RigParams::SuperLabia(p) => p.validate(bone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_defaults_from_empty_object() {
        let params: RigParams = serde_json::from_str(r#"{"type":"super_template"}"#).unwrap();
        assert_eq!(params, RigParams::SuperTemplate(StretchChainParams::default()));
        let RigParams::SuperTemplate(p) = params else {
            panic!("wrong variant");
        };
        assert_eq!(p.bbone_elements, 3);
        assert_eq!(p.bbone_segments, 5);
        assert!(p.guide_in_control);
        assert_eq!(p.tweak_layers, LayerMask::layer(1));
    }

    #[test]
    fn test_labia_defaults() {
        let p = OrganicChainParams::default();
        assert_eq!(p.bbones, 10);
        assert!(!p.tweak_extra_layers);
        assert_eq!(p.tweak_layers, LayerMask::layer(20));
        assert_eq!(p.single_bone_anchor, SingleBoneAnchor::Base);
    }

    #[test]
    fn test_ring_sizing_bone_can_be_null() {
        let params: RigParams =
            serde_json::from_str(r#"{"type":"super_ring","sizing_bone":null,"wing_elements":4}"#)
                .unwrap();
        assert_eq!(
            params,
            RigParams::SuperRing(RingParams {
                sizing_bone: None,
                wing_elements: 4
            })
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RigParams, _> =
            serde_json::from_str(r#"{"type":"super_dome","base":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_bulge_segments_minimum() {
        let params = BulgeParams {
            bbone_segments: 2,
            ..Default::default()
        };
        let err = params.validate("dome").unwrap_err();
        assert_eq!(err.code(), "G004");
        assert!(err.to_string().contains("bbone_segments"));
    }

    #[test]
    fn test_zero_wing_elements_rejected() {
        let params = RigParams::SuperRing(RingParams {
            wing_elements: 0,
            ..Default::default()
        });
        assert!(params.validate("ring").is_err());
    }

    #[test]
    fn test_blank_bone_names_rejected() {
        let params = DomeParams {
            base_bone: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(params.validate("dome").is_err());
    }

    #[test]
    fn test_rig_type_from_str() {
        assert_eq!("super_bulge".parse::<RigType>(), Ok(RigType::SuperBulge));
        assert!("super_arm".parse::<RigType>().is_err());
        for t in RigType::ALL {
            assert_eq!(RigParams::defaults(t).rig_type(), t);
        }
    }
}
