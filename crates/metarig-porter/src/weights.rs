//! Vertex-weight porter.
//!
//! A weight document maps vertex group names to `{vertex index: weight}`
//! objects. Vertex indices are JSON object keys, so they arrive as strings
//! and are checked before anything is written.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PorterError, PorterResult};

/// Weights at or below this value are not exported.
pub const EXPORT_THRESHOLD: f32 = 0.001;

/// Group name to vertex key to weight, as read from JSON.
pub type WeightDocument = BTreeMap<String, BTreeMap<String, f32>>;

/// Write access to a mesh's vertex groups.
pub trait WeightTarget {
    fn vertex_count(&self) -> u32;

    fn has_group(&self, group: &str) -> bool;

    fn create_group(&mut self, group: &str);

    /// Sets one weight, replacing any previous value.
    fn set_weight(&mut self, group: &str, vertex: u32, weight: f32);
}

/// In-memory vertex groups of one mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshWeights {
    pub vertex_count: u32,
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<u32, f32>>,
}

impl MeshWeights {
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            groups: BTreeMap::new(),
        }
    }

    pub fn weight(&self, group: &str, vertex: u32) -> Option<f32> {
        self.groups.get(group)?.get(&vertex).copied()
    }

    /// Parses a mesh document.
    pub fn from_json(json: &str) -> PorterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl WeightTarget for MeshWeights {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    fn create_group(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    fn set_weight(&mut self, group: &str, vertex: u32, weight: f32) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(vertex, weight);
    }
}

/// Outcome of a weight import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeightImportSummary {
    /// Groups that did not exist and were created.
    pub created_groups: Vec<String>,
    pub weights_set: usize,
}

/// Collects every weight above [`EXPORT_THRESHOLD`], keyed by group.
pub fn export_weights(mesh: &MeshWeights) -> WeightDocument {
    mesh.groups
        .iter()
        .map(|(group, weights)| {
            let kept = weights
                .iter()
                .filter(|(_, w)| **w > EXPORT_THRESHOLD)
                .map(|(v, w)| (v.to_string(), *w))
                .collect();
            (group.clone(), kept)
        })
        .collect()
}

/// A checked weight document, ready to apply.
type CheckedWeights = Vec<(String, Vec<(u32, f32)>)>;

fn check_weights(document: &WeightDocument, vertex_count: u32) -> PorterResult<CheckedWeights> {
    let mut checked = Vec::with_capacity(document.len());
    for (group, weights) in document {
        let mut entries = Vec::with_capacity(weights.len());
        for (key, &weight) in weights {
            let vertex = key
                .parse::<u32>()
                .ok()
                .filter(|v| *v < vertex_count)
                .ok_or_else(|| PorterError::InvalidVertex {
                    group: group.clone(),
                    key: key.clone(),
                })?;
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(PorterError::WeightOutOfRange {
                    group: group.clone(),
                    vertex,
                    weight,
                });
            }
            entries.push((vertex, weight));
        }
        checked.push((group.clone(), entries));
    }
    Ok(checked)
}

/// Validates the whole document, then writes it into `target`.
///
/// Missing groups are created; listed weights replace existing ones. On
/// error `target` is left unchanged.
pub fn apply_weights(
    target: &mut dyn WeightTarget,
    document: &WeightDocument,
) -> PorterResult<WeightImportSummary> {
    let checked = check_weights(document, target.vertex_count())?;
    let mut summary = WeightImportSummary::default();
    for (group, entries) in checked {
        if !target.has_group(&group) {
            debug!("creating vertex group '{}'", group);
            target.create_group(&group);
            summary.created_groups.push(group.clone());
        }
        for (vertex, weight) in entries {
            target.set_weight(&group, vertex, weight);
            summary.weights_set += 1;
        }
    }
    info!(
        "imported {} weights, {} new groups",
        summary.weights_set,
        summary.created_groups.len()
    );
    Ok(summary)
}

/// Parses a weight document.
pub fn parse_weights(json: &str) -> PorterResult<WeightDocument> {
    Ok(serde_json::from_str(json)?)
}

/// Writes the weights of `mesh` to `path`. Returns the number of groups.
pub fn export_weights_file(mesh: &MeshWeights, path: &Path) -> PorterResult<usize> {
    let document = export_weights(mesh);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json).map_err(|e| PorterError::io(path, e))?;
    Ok(document.len())
}

/// Reads a weight document from `path` and applies it to `target`.
pub fn import_weights_file(
    target: &mut dyn WeightTarget,
    path: &Path,
) -> PorterResult<WeightImportSummary> {
    let json = fs::read_to_string(path).map_err(|e| PorterError::io(path, e))?;
    let document = parse_weights(&json)?;
    apply_weights(target, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mesh() -> MeshWeights {
        let mut mesh = MeshWeights::new(4);
        mesh.set_weight("DEF-lip.L", 0, 1.0);
        mesh.set_weight("DEF-lip.L", 1, 0.0005);
        mesh.set_weight("DEF-lip.L", 2, 0.4);
        mesh
    }

    fn document(json: &str) -> WeightDocument {
        parse_weights(json).unwrap()
    }

    #[test]
    fn test_export_drops_negligible_weights() {
        let exported = export_weights(&mesh());
        let lip = &exported["DEF-lip.L"];
        assert_eq!(lip.keys().collect::<Vec<_>>(), vec!["0", "2"]);
        assert_eq!(lip["2"], 0.4);
    }

    #[test]
    fn test_import_creates_groups_and_replaces() {
        let mut mesh = mesh();
        let summary = apply_weights(
            &mut mesh,
            &document(r#"{"DEF-lip.L": {"2": 0.9}, "DEF-lip.R": {"3": 0.25}}"#),
        )
        .unwrap();
        assert_eq!(summary.created_groups, vec!["DEF-lip.R"]);
        assert_eq!(summary.weights_set, 2);
        assert_eq!(mesh.weight("DEF-lip.L", 2), Some(0.9));
        assert_eq!(mesh.weight("DEF-lip.L", 0), Some(1.0));
        assert_eq!(mesh.weight("DEF-lip.R", 3), Some(0.25));
    }

    #[test]
    fn test_invalid_entry_rejects_whole_document() {
        let before = mesh();
        for (json, code) in [
            (r#"{"DEF-a": {"1": 0.5}, "DEF-b": {"-1": 0.5}}"#, "P003"),
            (r#"{"DEF-a": {"x": 0.5}}"#, "P003"),
            (r#"{"DEF-a": {"4": 0.5}}"#, "P003"),
            (r#"{"DEF-a": {"1": 0.5}, "DEF-b": {"1": 1.5}}"#, "P004"),
            (r#"{"DEF-a": {"1": 0.0}}"#, "P004"),
        ] {
            let mut mesh = before.clone();
            let err = apply_weights(&mut mesh, &document(json)).unwrap_err();
            assert_eq!(err.code(), code, "{json}");
            assert_eq!(mesh, before);
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        assert_eq!(export_weights_file(&mesh(), &path).unwrap(), 1);

        let mut fresh = MeshWeights::new(4);
        let summary = import_weights_file(&mut fresh, &path).unwrap();
        assert_eq!(summary.created_groups, vec!["DEF-lip.L"]);
        assert_eq!(fresh.weight("DEF-lip.L", 1), None);
        assert_eq!(fresh.weight("DEF-lip.L", 2), Some(0.4));
    }

    #[test]
    fn test_mesh_document_uses_integer_keys() {
        let mesh = MeshWeights::from_json(r#"{"vertex_count": 3, "groups": {"g": {"1": 0.5}}}"#)
            .unwrap();
        assert_eq!(mesh.weight("g", 1), Some(0.5));
    }
}
