//! Rig variants.
//!
//! Each variant validates its guides at construction ([`init_rig`]) and then
//! plans its bones against the target skeleton, where every guide exists as
//! an `ORG-` copy.
//!
//! - [`stretch_chain`]: guide-in, shaft, guide-out chain with bendy segments
//! - [`dome`]: radial dome with a top control and stabilising borders
//! - [`bulge`]: dome refinement with per-border handle pairs
//! - [`ring`]: two symmetric wings swept around a radial bone
//! - [`organic_chain`]: arbitrary-length chain with a pivot control

pub mod bulge;
pub mod dome;
pub mod organic_chain;
pub mod ring;
pub mod stretch_chain;

use std::fmt::Debug;

use metarig_spec::{
    org_name, BoneName, GuideError, GuideResult, LayerMask, RigParams, RigType, RoleTag,
};

use crate::draft::RigDraft;
use crate::error::SkeletonResult;
use crate::metarig::RigAssignment;
use crate::plan::RigPlan;
use crate::skeleton::SkeletonView;

pub use bulge::BulgeRig;
pub use dome::DomeRig;
pub use organic_chain::OrganicChainRig;
pub use ring::RingRig;
pub use stretch_chain::StretchChainRig;

/// A validated rig instance.
pub trait RigVariant: Debug {
    fn rig_type(&self) -> RigType;

    /// Guide bone the rig is assigned to.
    fn bone(&self) -> &str;

    /// Metarig guide names this rig owns, root first.
    fn guides(&self) -> &[String];

    /// Plans the rig against a target holding `ORG-` copies of the guides.
    fn plan(&self, target: &dyn SkeletonView) -> SkeletonResult<RigPlan>;
}

/// Validates an assignment against the metarig and builds its variant.
///
/// Never mutates anything; every structural guide error surfaces here.
pub fn init_rig(
    metarig: &dyn SkeletonView,
    assignment: &RigAssignment,
) -> GuideResult<Box<dyn RigVariant>> {
    let bone = assignment.bone.as_str();
    if !metarig.contains(bone) {
        return Err(GuideError::UnknownRigBone {
            bone: bone.to_string(),
        });
    }
    assignment.rig.validate(bone)?;
    Ok(match &assignment.rig {
        RigParams::SuperTemplate(p) => Box::new(StretchChainRig::new(metarig, bone, p.clone())?),
        RigParams::SuperDome(p) => Box::new(DomeRig::new(metarig, bone, p.clone())?),
        RigParams::SuperBulge(p) => Box::new(BulgeRig::new(metarig, bone, p.clone())?),
        RigParams::SuperRing(p) => Box::new(RingRig::new(metarig, bone, p.clone())?),
        RigParams::SuperLabia(p) => Box::new(OrganicChainRig::new(metarig, bone, p.clone())?),
    })
}

/// Metarig lookups are infallible once the rig bone is known to exist; a
/// missing bone here means the metarig changed under us.
pub(crate) fn guide_error(bone: &str) -> impl Fn(crate::error::SkeletonError) -> GuideError + '_ {
    move |_| GuideError::UnknownRigBone {
        bone: bone.to_string(),
    }
}

/// Checks that a parameter naming a guide bone points at an existing bone.
pub(crate) fn require_guide(
    metarig: &dyn SkeletonView,
    bone: &str,
    rig_type: RigType,
    role: &'static str,
    name: &str,
) -> GuideResult<()> {
    if metarig.contains(name) {
        Ok(())
    } else {
        Err(GuideError::MissingGuide {
            bone: bone.to_string(),
            rig_type,
            role,
            missing: name.to_string(),
        })
    }
}

/// Name of a guide's copy in `role`.
pub(crate) fn role_name(guide: &str, role: RoleTag) -> BoneName {
    BoneName::parse(guide).with_role(role)
}

pub(crate) fn orgs(guides: &[String]) -> Vec<String> {
    guides.iter().map(|g| org_name(g)).collect()
}

/// Applies the tweak layer mask when enabled.
pub(crate) fn apply_tweak_layers(
    draft: &mut RigDraft<'_>,
    tweak: &str,
    enabled: bool,
    layers: LayerMask,
) -> SkeletonResult<()> {
    if enabled {
        draft.set_layers(tweak, layers)?;
    }
    Ok(())
}

/// Base bone of a dome-like rig: explicit parameter, else metarig parent.
///
/// `None` means the variant synthesizes one.
pub(crate) fn resolve_base(
    metarig: &dyn SkeletonView,
    bone: &str,
    rig_type: RigType,
    base_bone: Option<&str>,
) -> GuideResult<Option<String>> {
    match base_bone {
        Some(base) => {
            require_guide(metarig, bone, rig_type, "base", base)?;
            Ok(Some(base.to_string()))
        }
        None => metarig.parent(bone).map_err(guide_error(bone)),
    }
}
