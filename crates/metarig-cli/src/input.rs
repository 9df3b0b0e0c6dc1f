//! Document loading and writing shared by the commands.

use anyhow::{Context, Result};
use metarig_porter::MeshWeights;
use metarig_rigs::{Armature, Metarig};
use serde::Serialize;
use std::fs;
use std::path::Path;

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Loads a metarig document (armature plus rig assignments).
pub fn load_metarig(path: &Path) -> Result<Metarig> {
    let json = read(path)?;
    Metarig::from_json(&json).with_context(|| format!("Failed to parse metarig {}", path.display()))
}

/// Loads a bare armature document, such as a generated rig.
pub fn load_armature(path: &Path) -> Result<Armature> {
    let json = read(path)?;
    Armature::from_json(&json).with_context(|| format!("Failed to parse armature {}", path.display()))
}

/// Loads a mesh weight document.
pub fn load_mesh(path: &Path) -> Result<MeshWeights> {
    let json = read(path)?;
    MeshWeights::from_json(&json).with_context(|| format!("Failed to parse mesh {}", path.display()))
}

/// Writes `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metarig_rigs::samples::sample;
    use metarig_spec::RigType;

    #[test]
    fn test_metarig_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ring.json");
        let metarig = sample(RigType::SuperRing);
        write_json(&metarig, &path).unwrap();

        let loaded = load_metarig(&path).unwrap();
        assert_eq!(loaded.rigs, metarig.rigs);
        assert_eq!(
            loaded.armature.content_hash().unwrap(),
            metarig.armature.content_hash().unwrap()
        );
    }

    #[test]
    fn test_load_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_armature(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
