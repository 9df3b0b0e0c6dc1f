//! Pose porter.
//!
//! A pose document maps bone names to their local pose matrix as 16
//! row-major floats:
//!
//! ```json
//! { "lip.L": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::Mat4;
use log::{debug, warn};
use metarig_rigs::Armature;
use metarig_spec::LayerMask;
use serde::Serialize;

use crate::error::{PorterError, PorterResult};

/// Bone name to row-major pose matrix. Keys serialise sorted.
pub type PoseDocument = BTreeMap<String, [f32; 16]>;

/// Outcome of a pose import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoseImportSummary {
    pub applied: Vec<String>,
    /// Bones named by the document that the armature does not have.
    pub skipped: Vec<String>,
}

fn to_row_major(m: Mat4) -> [f32; 16] {
    m.transpose().to_cols_array()
}

fn from_row_major(rows: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(rows).transpose()
}

/// Collects the pose of every bone on at least one layer of `layers`.
pub fn export_pose(armature: &Armature, layers: LayerMask) -> PoseDocument {
    armature
        .bones()
        .iter()
        .filter(|bone| bone.layers.intersects(layers))
        .map(|bone| (bone.name.clone(), to_row_major(bone.pose)))
        .collect()
}

/// Applies a parsed pose document. Unknown bones are skipped.
pub fn apply_pose(armature: &mut Armature, document: &PoseDocument) -> PoseImportSummary {
    let mut summary = PoseImportSummary::default();
    for (name, rows) in document {
        match armature.set_pose(name, from_row_major(rows)) {
            Ok(()) => summary.applied.push(name.clone()),
            Err(_) => {
                warn!("pose for unknown bone '{}' skipped", name);
                summary.skipped.push(name.clone());
            }
        }
    }
    summary
}

/// Parses a pose document. Nothing is applied if any entry is malformed.
pub fn parse_pose(json: &str) -> PorterResult<PoseDocument> {
    Ok(serde_json::from_str(json)?)
}

/// Writes the pose of the bones on `layers` to `path`.
pub fn export_pose_file(
    armature: &Armature,
    layers: LayerMask,
    path: &Path,
) -> PorterResult<usize> {
    let document = export_pose(armature, layers);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json).map_err(|e| PorterError::io(path, e))?;
    debug!("exported {} bone poses to {}", document.len(), path.display());
    Ok(document.len())
}

/// Reads a pose document from `path` and applies it.
pub fn import_pose_file(armature: &mut Armature, path: &Path) -> PorterResult<PoseImportSummary> {
    let json = fs::read_to_string(path).map_err(|e| PorterError::io(path, e))?;
    let document = parse_pose(&json)?;
    Ok(apply_pose(armature, &document))
}
