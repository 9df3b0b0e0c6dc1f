//! Metarig Porters
//!
//! JSON import and export of pose matrices and vertex weights for generated
//! rigs.
//!
//! - [`pose`]: Per-bone local pose matrices, filtered by layer on export
//! - [`weights`]: Vertex-group weights, validated as a whole before import
//!
//! Imports parse the entire document before touching the target, so a
//! malformed file never leaves a half-applied pose or weight set.

pub mod error;
pub mod pose;
pub mod weights;

pub use error::{PorterError, PorterResult};
pub use pose::{
    apply_pose, export_pose, export_pose_file, import_pose_file, parse_pose, PoseDocument,
    PoseImportSummary,
};
pub use weights::{
    apply_weights, export_weights, export_weights_file, import_weights_file, parse_weights,
    MeshWeights, WeightDocument, WeightImportSummary, WeightTarget,
};
