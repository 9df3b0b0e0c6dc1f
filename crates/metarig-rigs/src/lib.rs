//! Metarig Rig Generator
//!
//! This crate turns a metarig (a small skeleton of guide bones with rig
//! assignments) into a full rig: mechanism, control, tweak and deform bones
//! plus the constraints that couple them.
//!
//! # Overview
//!
//! Five rig variants are supported:
//!
//! - **`super_template`** - Stretchy shaft between a guide-in and guide-out control
//! - **`super_dome`** - Dome stretched toward a control, with border tweaks
//! - **`super_bulge`** - Dome with bendy border deforms and handle mechanisms
//! - **`super_ring`** - Two mirrored wings of deform bones around a radial guide
//! - **`super_labia`** - Organic bendy chain with a pivot and converging tweak
//!
//! # Architecture
//!
//! Generation runs in two halves:
//!
//! 1. **Planning** - Each variant reads the guides through [`SkeletonView`] and
//!    records bones, constraints and parent links in a [`RigPlan`]
//! 2. **Replay** - The [`orchestrator`] copies the metarig into the target as
//!    `ORG-` bones and replays each plan through the phase-checked
//!    [`Skeleton`] interface
//!
//! Structural errors in the guides are reported before the target is touched.
//! [`Armature`] is the in-memory host used by the CLI and the tests.
//!
//! # Example
//!
//! ```
//! use metarig_rigs::{generate, samples, RigType, RoleTag};
//!
//! let metarig = samples::sample(RigType::SuperRing);
//! let rig = generate(&metarig).unwrap();
//! assert_eq!(rig.reports[0].names(RoleTag::Deform).len(), 6);
//! ```

pub mod armature;
pub mod draft;
pub mod emission;
pub mod error;
pub mod geometry;
pub mod metarig;
pub mod offset;
pub mod orchestrator;
pub mod plan;
pub mod rigs;
pub mod samples;
pub mod skeleton;
pub mod topology;

pub use armature::{Armature, BoneRecord, ConstraintRecord, JournalEntry, SkeletonOp};
pub use error::{
    GenerationError, GenerationResult, LoadError, SkeletonError, SkeletonResult,
};
pub use metarig::{Metarig, RigAssignment};
pub use offset::make_offset_bone;
pub use orchestrator::{
    apply_plan, generate, generate_into, ingest, validate_metarig, GeneratedRig, RigReport,
    RigState,
};
pub use plan::{DerivedBone, ParentLink, RigPlan};
pub use rigs::{init_rig, RigVariant};
pub use skeleton::{Phase, Skeleton, SkeletonView};

pub use metarig_spec::{RigParams, RigType, RoleTag};
