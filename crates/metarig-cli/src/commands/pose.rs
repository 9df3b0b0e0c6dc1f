//! Pose command implementation
//!
//! Exports and imports bone pose matrices of a generated rig.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use metarig_porter::{export_pose_file, import_pose_file, PoseImportSummary};
use metarig_spec::LayerMask;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::report;
use crate::input::{load_armature, write_json};

/// Number of bone layers a mask can address.
const LAYER_COUNT: u32 = 32;

/// Builds a layer mask from layer indices; no indices means every layer.
pub fn layer_mask(layers: &[u32]) -> Result<LayerMask> {
    if layers.is_empty() {
        return Ok(LayerMask::ALL);
    }
    let mut mask = 0;
    for &layer in layers {
        if layer >= LAYER_COUNT {
            bail!("layer {} is out of range (0-{})", layer, LAYER_COUNT - 1);
        }
        mask |= LayerMask::layer(layer).0;
    }
    Ok(LayerMask(mask))
}

#[derive(Debug, Serialize)]
struct ExportResult {
    bones: usize,
    layers: String,
    output: String,
}

/// Run `pose export`
pub fn run_export(
    rig_path: &str,
    layers: &[u32],
    out_path: &str,
    json_output: bool,
) -> Result<ExitCode> {
    let result = layer_mask(layers).and_then(|mask| {
        let armature = load_armature(Path::new(rig_path))?;
        let bones = export_pose_file(&armature, mask, Path::new(out_path))
            .with_context(|| format!("Failed to export pose to {}", out_path))?;
        Ok(ExportResult {
            bones,
            layers: mask.to_string(),
            output: out_path.to_string(),
        })
    });
    report(result, json_output, |exported| {
        println!(
            "{} {} bone pose(s) on layers {} to {}",
            "Exported".green().bold(),
            exported.bones,
            exported.layers,
            exported.output
        );
    })
}

/// Run `pose import`
///
/// Bones missing from the rig are skipped and listed.
pub fn run_import(
    rig_path: &str,
    pose_path: &str,
    out_path: &str,
    json_output: bool,
) -> Result<ExitCode> {
    let result = load_armature(Path::new(rig_path)).and_then(|mut armature| {
        let summary = import_pose_file(&mut armature, Path::new(pose_path))
            .with_context(|| format!("Failed to import pose from {}", pose_path))?;
        write_json(&armature, Path::new(out_path))?;
        Ok(summary)
    });
    report(result, json_output, |summary: &PoseImportSummary| {
        println!(
            "{} {} bone pose(s), skipped {}",
            "Applied".green().bold(),
            summary.applied.len(),
            summary.skipped.len()
        );
        for name in &summary.skipped {
            println!("  {} no bone '{}'", "!".yellow(), name);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use metarig_rigs::generate;
    use metarig_rigs::samples::sample;
    use metarig_spec::RigType;

    #[test]
    fn test_layer_mask_from_indices() {
        assert_eq!(layer_mask(&[]).unwrap(), LayerMask::ALL);
        assert_eq!(layer_mask(&[0, 20]).unwrap(), LayerMask((1 << 20) | 1));
        assert_eq!(layer_mask(&[31]).unwrap(), LayerMask(1 << 31));
    }

    #[test]
    fn test_out_of_range_layer_is_rejected() {
        let err = layer_mask(&[0, 40]).unwrap_err();
        assert!(err.to_string().contains("layer 40"));

        let dir = tempfile::tempdir().unwrap();
        let rig_path = dir.path().join("rig.json");
        let pose_path = dir.path().join("pose.json");
        write_json(&generate(&sample(RigType::SuperRing)).unwrap().armature, &rig_path).unwrap();
        let code = run_export(rig_path.to_str().unwrap(), &[32], pose_path.to_str().unwrap(), true)
            .unwrap();
        assert_eq!(code, ExitCode::from(1));
        assert!(!pose_path.exists());
        assert!(run_export(rig_path.to_str().unwrap(), &[32], pose_path.to_str().unwrap(), false).is_err());
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let rig_path = dir.path().join("rig.json");
        let pose_path = dir.path().join("pose.json");
        let out = dir.path().join("posed.json");
        let rig = generate(&sample(RigType::SuperLabia)).unwrap();
        write_json(&rig.armature, &rig_path).unwrap();

        let rig_str = rig_path.to_str().unwrap();
        let code = run_export(rig_str, &[0], pose_path.to_str().unwrap(), false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let document = metarig_porter::parse_pose(&std::fs::read_to_string(&pose_path).unwrap()).unwrap();
        assert!(!document.is_empty());

        let code = run_import(rig_str, pose_path.to_str().unwrap(), out.to_str().unwrap(), true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.exists());
    }
}
