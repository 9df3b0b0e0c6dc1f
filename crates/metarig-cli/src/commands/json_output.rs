//! JSON output types for machine-readable CLI output.
//!
//! Every command that accepts `--json` prints exactly one of these documents
//! to stdout and nothing else.

use std::collections::BTreeMap;

use metarig_porter::PorterError;
use metarig_rigs::{GenerationError, LoadError, RigReport, SkeletonError};
use metarig_spec::GuideError;
use serde::Serialize;
use std::process::ExitCode;

/// Error codes for CLI-level failures.
///
/// Guide, skeleton and porter errors pass their own codes through.
pub mod error_codes {
    /// Input file could not be read or parsed
    pub const INPUT: &str = "CLI_001";
    /// Output file could not be written
    pub const OUTPUT: &str = "CLI_002";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "G001")
    pub code: String,
    pub message: String,
    /// Guide bone of the failing rig (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bone: Option<String>,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            bone: None,
        }
    }

    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.bone = Some(bone.into());
        self
    }

    /// Wraps an `anyhow` error, keeping its full context chain.
    ///
    /// The code of the first library error in the chain wins over `code`.
    pub fn from_anyhow(code: &str, err: &anyhow::Error) -> Self {
        Self::new(library_code(err).unwrap_or(code), format!("{:#}", err))
    }
}

/// Stable code of the first guide, skeleton, load or porter error in the chain.
fn library_code(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<PorterError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<SkeletonError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GuideError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GenerationError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<LoadError>().map(LoadError::code)
        }
    })
}

/// Output of `validate --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub success: bool,
    /// Number of rig assignments checked
    pub rigs: usize,
    pub errors: Vec<JsonError>,
}

/// Per-rig summary in `generate --json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RigSummary {
    pub bone: String,
    pub rig_type: String,
    pub root: String,
    /// Created bones per role tier
    pub tiers: BTreeMap<String, usize>,
    pub constraints: usize,
}

impl From<&RigReport> for RigSummary {
    fn from(report: &RigReport) -> Self {
        Self {
            bone: report.bone.clone(),
            rig_type: report.rig_type.to_string(),
            root: report.root.clone(),
            tiers: report
                .tier_counts()
                .into_iter()
                .map(|(role, count)| (role.to_string(), count))
                .collect(),
            constraints: report.constraint_count,
        }
    }
}

/// Output of `generate --json`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub rigs: Vec<RigSummary>,
    pub errors: Vec<JsonError>,
}

impl GenerateOutput {
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            hash: None,
            output: None,
            rigs: Vec::new(),
            errors,
        }
    }
}

/// Output of the single-result commands (`sample`, `offset-bone`, porters).
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    pub errors: Vec<JsonError>,
}

impl<T: Serialize> CommandOutput<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: Vec::new(),
        }
    }

    pub fn failure(error: JsonError) -> Self {
        Self {
            success: false,
            result: None,
            errors: vec![error],
        }
    }

    /// Wraps a command result; errors keep the code of their library error.
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => Self::failure(JsonError::from_anyhow(error_codes::INPUT, &e)),
        }
    }
}

/// Prints a JSON document to stdout.
pub fn print<T: Serialize>(output: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

/// Finishes a single-result command.
///
/// With `json_output` the result or error is printed as a [`CommandOutput`]
/// and turned into an exit code; otherwise `human` prints the result and
/// errors propagate.
pub fn report<T: Serialize>(
    result: anyhow::Result<T>,
    json_output: bool,
    human: impl FnOnce(&T),
) -> anyhow::Result<ExitCode> {
    if json_output {
        let output = CommandOutput::from_result(result);
        let success = output.success;
        print(&output)?;
        return Ok(if success {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }
    human(&result?);
    Ok(ExitCode::SUCCESS)
}
