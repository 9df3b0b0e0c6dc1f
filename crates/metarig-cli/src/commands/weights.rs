//! Weights command implementation
//!
//! Exports and imports vertex-group weights of a mesh document.

use anyhow::{Context, Result};
use colored::Colorize;
use metarig_porter::{export_weights_file, import_weights_file, WeightImportSummary};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::report;
use crate::input::{load_mesh, write_json};

#[derive(Debug, Serialize)]
struct ExportResult {
    groups: usize,
    output: String,
}

/// Run `weights export`
pub fn run_export(mesh_path: &str, out_path: &str, json_output: bool) -> Result<ExitCode> {
    let result = load_mesh(Path::new(mesh_path)).and_then(|mesh| {
        let groups = export_weights_file(&mesh, Path::new(out_path))
            .with_context(|| format!("Failed to export weights to {}", out_path))?;
        Ok(ExportResult {
            groups,
            output: out_path.to_string(),
        })
    });
    report(result, json_output, |exported| {
        println!(
            "{} {} vertex group(s) to {}",
            "Exported".green().bold(),
            exported.groups,
            exported.output
        );
    })
}

fn import(mesh_path: &str, weights_path: &str, out_path: &str) -> Result<WeightImportSummary> {
    let mut mesh = load_mesh(Path::new(mesh_path))?;
    let summary = import_weights_file(&mut mesh, Path::new(weights_path))
        .with_context(|| format!("Failed to import weights from {}", weights_path))?;
    write_json(&mesh, Path::new(out_path))?;
    Ok(summary)
}

/// Run `weights import`
///
/// The weight document is validated in full before the mesh is changed; on
/// error nothing is written.
pub fn run_import(mesh_path: &str, weights_path: &str, out_path: &str, json_output: bool) -> Result<ExitCode> {
    let result = import(mesh_path, weights_path, out_path);
    report(result, json_output, |summary: &WeightImportSummary| {
        println!(
            "{} {} weight(s), created {} group(s)",
            "Imported".green().bold(),
            summary.weights_set,
            summary.created_groups.len()
        );
        for group in &summary.created_groups {
            println!("  {} new group '{}'", "+".cyan(), group);
        }
    })
}
