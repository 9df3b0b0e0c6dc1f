//! Validate command implementation
//!
//! Runs the init checks of every rig assignment in a metarig without
//! generating anything.

use anyhow::Result;
use colored::Colorize;
use metarig_rigs::validate_metarig;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{self, error_codes, JsonError, ValidateOutput};
use crate::input::load_metarig;

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if every rig assignment is valid, 1 otherwise
pub fn run(metarig_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(metarig_path)
    } else {
        run_human(metarig_path)
    }
}

fn run_human(metarig_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), metarig_path);
    let metarig = load_metarig(Path::new(metarig_path))?;
    let errors = validate_metarig(&metarig);

    for assignment in &metarig.rigs {
        let failed = errors.iter().any(|e| e.bone() == assignment.bone);
        let mark = if failed { "x".red() } else { "ok".green() };
        println!("  {} {} on '{}'", mark, assignment.rig_type(), assignment.bone);
    }
    for error in &errors {
        println!("  {} [{}] {}", "error".red(), error.code(), error);
    }

    if errors.is_empty() {
        println!(
            "\n{} {} rig assignment(s) valid",
            "SUCCESS".green().bold(),
            metarig.rigs.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!("\n{} {} error(s)", "FAILED".red().bold(), errors.len());
        Ok(ExitCode::from(1))
    }
}

fn run_json(metarig_path: &str) -> Result<ExitCode> {
    let metarig = match load_metarig(Path::new(metarig_path)) {
        Ok(metarig) => metarig,
        Err(e) => {
            json_output::print(&ValidateOutput {
                success: false,
                rigs: 0,
                errors: vec![JsonError::from_anyhow(error_codes::INPUT, &e)],
            })?;
            return Ok(ExitCode::from(1));
        }
    };

    let errors: Vec<JsonError> = validate_metarig(&metarig)
        .iter()
        .map(|e| JsonError::new(e.code(), e.to_string()).with_bone(e.bone()))
        .collect();
    let success = errors.is_empty();
    json_output::print(&ValidateOutput {
        success,
        rigs: metarig.rigs.len(),
        errors,
    })?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
