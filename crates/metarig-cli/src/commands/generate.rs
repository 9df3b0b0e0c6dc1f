//! Generate command implementation
//!
//! Generates the full rig of a metarig and writes the resulting armature.

use anyhow::{Context, Result};
use colored::Colorize;
use metarig_rigs::{generate, GeneratedRig, GenerationError};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use super::json_output::{self, error_codes, GenerateOutput, JsonError, RigSummary};
use crate::input::{load_metarig, write_json};

/// Run the generate command
///
/// # Arguments
/// * `metarig_path` - Metarig document to generate from
/// * `out_path` - Where to write the generated armature
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 if generation failed
pub fn run(metarig_path: &str, out_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(metarig_path, out_path)
    } else {
        run_human(metarig_path, out_path)
    }
}

fn generation_error_to_json(err: &GenerationError) -> JsonError {
    let json = JsonError::new(err.code(), err.to_string());
    match err {
        GenerationError::Guide(e) => json.with_bone(e.bone()),
        GenerationError::Skeleton { bone, .. } => json.with_bone(bone.clone()),
        GenerationError::Host(_) => json,
    }
}

fn write_rig(rig: &GeneratedRig, out_path: &str) -> Result<String> {
    write_json(&rig.armature, Path::new(out_path))?;
    rig.content_hash().context("Failed to hash generated rig")
}

fn run_human(metarig_path: &str, out_path: &str) -> Result<ExitCode> {
    let start = Instant::now();
    println!("{} {}", "Generating:".cyan().bold(), metarig_path);
    let metarig = load_metarig(Path::new(metarig_path))?;

    let rig = match generate(&metarig) {
        Ok(rig) => rig,
        Err(e) => {
            let stage = if e.is_structural() { "invalid metarig" } else { "generation failed" };
            println!("  {} [{}] {}: {}", "error".red(), e.code(), stage, e);
            println!("\n{}", "FAILED".red().bold());
            return Ok(ExitCode::from(1));
        }
    };

    for report in &rig.reports {
        let tiers: Vec<String> = report
            .tier_counts()
            .iter()
            .map(|(role, count)| format!("{} {}", count, role))
            .collect();
        println!(
            "  {} {} on '{}': {}, {} constraints",
            "ok".green(),
            report.rig_type,
            report.bone,
            tiers.join(", "),
            report.constraint_count
        );
    }

    let hash = write_rig(&rig, out_path)?;
    println!("{} {}", "Output:".dimmed(), out_path);
    println!("{} {}", "Hash:".dimmed(), hash);
    println!(
        "\n{} {} bones ({}ms)",
        "SUCCESS".green().bold(),
        rig.armature.len(),
        start.elapsed().as_millis()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(metarig_path: &str, out_path: &str) -> Result<ExitCode> {
    let metarig = match load_metarig(Path::new(metarig_path)) {
        Ok(metarig) => metarig,
        Err(e) => {
            let error = JsonError::from_anyhow(error_codes::INPUT, &e);
            json_output::print(&GenerateOutput::failure(vec![error]))?;
            return Ok(ExitCode::from(1));
        }
    };

    let rig = match generate(&metarig) {
        Ok(rig) => rig,
        Err(e) => {
            json_output::print(&GenerateOutput::failure(vec![generation_error_to_json(&e)]))?;
            return Ok(ExitCode::from(1));
        }
    };

    let hash = match write_rig(&rig, out_path) {
        Ok(hash) => hash,
        Err(e) => {
            let error = JsonError::from_anyhow(error_codes::OUTPUT, &e);
            json_output::print(&GenerateOutput::failure(vec![error]))?;
            return Ok(ExitCode::from(1));
        }
    };

    json_output::print(&GenerateOutput {
        success: true,
        hash: Some(hash),
        output: Some(out_path.to_string()),
        rigs: rig.reports.iter().map(RigSummary::from).collect(),
        errors: Vec::new(),
    })?;
    Ok(ExitCode::SUCCESS)
}
