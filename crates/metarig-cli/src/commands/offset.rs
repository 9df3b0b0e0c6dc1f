//! Offset-bone command implementation
//!
//! Adds an offset parent above one bone of an existing rig.

use anyhow::{Context, Result};
use colored::Colorize;
use metarig_rigs::make_offset_bone;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::report;
use crate::input::{load_armature, write_json};

#[derive(Debug, Serialize)]
struct OffsetResult {
    bone: String,
    offset: String,
    output: String,
}

fn apply(rig_path: &str, bone: &str, out_path: &str) -> Result<String> {
    let mut armature = load_armature(Path::new(rig_path))?;
    let offset = make_offset_bone(&mut armature, bone)
        .with_context(|| format!("Failed to add offset bone above '{}'", bone))?;
    write_json(&armature, Path::new(out_path))?;
    Ok(offset)
}

/// Run the offset-bone command
pub fn run(rig_path: &str, bone: &str, out_path: &str, json_output: bool) -> Result<ExitCode> {
    let result = apply(rig_path, bone, out_path).map(|offset| OffsetResult {
        bone: bone.to_string(),
        offset,
        output: out_path.to_string(),
    });
    report(result, json_output, |added| {
        println!(
            "{} '{}' above '{}' in {}",
            "Added".green().bold(),
            added.offset,
            added.bone,
            added.output
        );
    })
}
