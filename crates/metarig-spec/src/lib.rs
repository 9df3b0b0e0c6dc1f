//! Metarig Data Model
//!
//! This crate provides the types shared by every stage of rig generation:
//! bone geometry, role and side naming, deferred constraint requests,
//! pose-phase bone settings and per-variant rig parameters.
//!
//! # Overview
//!
//! A metarig is a small skeleton of user-placed *guide* bones. Rig variants
//! read the guides plus a [`RigParams`] value and plan a larger set of
//! mechanism, control, tweak and deform bones. Everything in this crate is
//! plain data; the generator lives in `metarig-rigs`.
//!
//! # Example
//!
//! ```
//! use metarig_spec::{BoneName, RigParams, RigType, RoleTag};
//!
//! let guide = BoneName::parse("lip.L");
//! let deform = guide.with_role(RoleTag::Deform).with_ordinal(1);
//! assert_eq!(deform.render(), "DEF-lip.001.L");
//!
//! let params = RigParams::defaults(RigType::SuperRing);
//! assert!(params.validate("ring").is_ok());
//! ```
//!
//! # Modules
//!
//! - [`bone`]: Bone transforms, local axes and roll math
//! - [`naming`]: Role tags, side suffixes and structured bone names
//! - [`constraint`]: Deferred constraint requests
//! - [`binding`]: Locks, widgets and layer masks
//! - [`params`]: Per-variant rig parameters
//! - [`error`]: Structural guide errors
//! - [`hash`]: Canonical hashing

pub mod binding;
pub mod bone;
pub mod constraint;
pub mod error;
pub mod hash;
pub mod naming;
pub mod params;

pub use binding::{LayerMask, Locks, WidgetKind};
pub use bone::{Axis, BBoneShape, BoneTransform};
pub use constraint::{
    AngleRange, AxisFlags, ConstraintKind, ConstraintParam, ConstraintSpec, ParamValue, Space,
};
pub use error::{BoneCountRule, GuideError, GuideResult, SpecError, SpecResult};
pub use naming::{derive_name, org_name, side_suffix, strip_role_prefix, BoneName, RoleTag, Side};
pub use params::{
    BulgeParams, DomeParams, OrganicChainParams, RigParams, RigType, RingParams,
    SingleBoneAnchor, StretchChainParams, TweakAxis,
};

/// Re-exported vector type used for all bone positions.
pub use glam::Vec3;
