//! Sample command implementation
//!
//! Writes a minimal valid metarig for one rig variant.

use anyhow::Result;
use colored::Colorize;
use metarig_rigs::samples::{sample, sample_bone};
use metarig_spec::RigType;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::report;
use crate::input::write_json;

#[derive(Debug, Serialize)]
struct SampleResult {
    rig_type: String,
    bone: String,
    bones: usize,
    output: String,
}

/// Run the sample command
pub fn run(rig_type: RigType, out_path: &str, json_output: bool) -> Result<ExitCode> {
    let metarig = sample(rig_type);
    let result = write_json(&metarig, Path::new(out_path)).map(|()| SampleResult {
        rig_type: rig_type.to_string(),
        bone: sample_bone(rig_type).to_string(),
        bones: metarig.armature.len(),
        output: out_path.to_string(),
    });
    report(result, json_output, |written| {
        println!(
            "{} {} sample ({} bones, rig on '{}') to {}",
            "Wrote".green().bold(),
            written.rig_type,
            written.bones,
            written.bone,
            written.output
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::load_metarig;

    #[test]
    fn test_sample_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        for rig_type in RigType::ALL {
            let path = dir.path().join(format!("{}.json", rig_type));
            let code = run(rig_type, path.to_str().unwrap(), false).unwrap();
            assert_eq!(code, ExitCode::SUCCESS);
            let metarig = load_metarig(&path).unwrap();
            assert_eq!(metarig.rigs[0].rig_type(), rig_type);
        }
    }
}
