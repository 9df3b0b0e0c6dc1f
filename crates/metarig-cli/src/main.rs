//! Metarig CLI - Command-line interface for procedural rig generation
//!
//! This binary validates metarigs, generates rigs from them, and moves pose
//! and weight data in and out of generated rigs.

use clap::{Parser, Subcommand};
use metarig_spec::RigType;
use std::process::ExitCode;

use metarig_cli::commands;

/// Metarig - Procedural bone-hierarchy generator
#[derive(Parser)]
#[command(name = "metarig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every rig assignment of a metarig without generating
    Validate {
        /// Path to the metarig JSON document
        #[arg(short, long)]
        metarig: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Generate the full rig of a metarig
    Generate {
        /// Path to the metarig JSON document
        #[arg(short, long)]
        metarig: String,

        /// Output path for the generated armature
        #[arg(short, long)]
        out: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write a minimal metarig for one rig type
    Sample {
        /// Rig type (super_template, super_dome, super_bulge, super_ring, super_labia)
        #[arg(short, long)]
        rig_type: RigType,

        /// Output path for the metarig
        #[arg(short, long)]
        out: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Insert an offset parent above one bone of a rig
    OffsetBone {
        /// Path to the rig armature JSON
        #[arg(short, long)]
        rig: String,

        /// Bone to wrap
        #[arg(short, long)]
        bone: String,

        /// Output path for the modified armature
        #[arg(short, long)]
        out: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Export or import bone poses
    Pose {
        #[command(subcommand)]
        command: PoseCommands,
    },

    /// Export or import vertex-group weights
    Weights {
        #[command(subcommand)]
        command: WeightCommands,
    },
}

/// Subcommands for pose transfer
#[derive(Subcommand, Debug)]
enum PoseCommands {
    /// Write the pose of bones on the given layers
    Export {
        #[arg(short, long)]
        rig: String,

        /// Layer indices to include (default: all layers)
        #[arg(short, long, value_delimiter = ',')]
        layers: Vec<u32>,

        #[arg(short, long)]
        out: String,

        #[arg(long)]
        json: bool,
    },
    /// Apply a pose document to a rig
    Import {
        #[arg(short, long)]
        rig: String,

        /// Pose document to apply
        #[arg(short, long)]
        pose: String,

        /// Output path for the posed armature
        #[arg(short, long)]
        out: String,

        #[arg(long)]
        json: bool,
    },
}

/// Subcommands for weight transfer
#[derive(Subcommand, Debug)]
enum WeightCommands {
    /// Write the non-negligible weights of every vertex group
    Export {
        #[arg(short, long)]
        mesh: String,

        #[arg(short, long)]
        out: String,

        #[arg(long)]
        json: bool,
    },
    /// Validate and apply a weight document to a mesh
    Import {
        #[arg(short, long)]
        mesh: String,

        /// Weight document to apply
        #[arg(short, long)]
        weights: String,

        /// Output path for the updated mesh
        #[arg(short, long)]
        out: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { metarig, json } => commands::validate::run(&metarig, json),
        Commands::Generate { metarig, out, json } => commands::generate::run(&metarig, &out, json),
        Commands::Sample {
            rig_type,
            out,
            json,
        } => commands::sample::run(rig_type, &out, json),
        Commands::OffsetBone {
            rig,
            bone,
            out,
            json,
        } => commands::offset::run(&rig, &bone, &out, json),
        Commands::Pose { command } => match command {
            PoseCommands::Export {
                rig,
                layers,
                out,
                json,
            } => commands::pose::run_export(&rig, &layers, &out, json),
            PoseCommands::Import {
                rig,
                pose,
                out,
                json,
            } => commands::pose::run_import(&rig, &pose, &out, json),
        },
        Commands::Weights { command } => match command {
            WeightCommands::Export { mesh, out, json } => {
                commands::weights::run_export(&mesh, &out, json)
            }
            WeightCommands::Import {
                mesh,
                weights,
                out,
                json,
            } => commands::weights::run_import(&mesh, &weights, &out, json),
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate() {
        let cli =
            Cli::try_parse_from(["metarig", "generate", "-m", "rig.json", "-o", "out.json", "--json"])
                .unwrap();
        match cli.command {
            Commands::Generate { metarig, out, json } => {
                assert_eq!(metarig, "rig.json");
                assert_eq!(out, "out.json");
                assert!(json);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_rig_type() {
        let cli = Cli::try_parse_from([
            "metarig",
            "sample",
            "--rig-type",
            "super_bulge",
            "--out",
            "bulge.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Sample { rig_type, .. } => assert_eq!(rig_type, RigType::SuperBulge),
            _ => panic!("expected sample command"),
        }
        assert!(Cli::try_parse_from(["metarig", "sample", "--rig-type", "spine", "-o", "x"]).is_err());
    }

    #[test]
    fn test_cli_parses_pose_export_layers() {
        let cli = Cli::try_parse_from([
            "metarig", "pose", "export", "--rig", "rig.json", "--layers", "0,20", "--out", "p.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Pose {
                command: PoseCommands::Export { layers, .. },
            } => assert_eq!(layers, vec![0, 20]),
            _ => panic!("expected pose export command"),
        }
    }

    #[test]
    fn test_cli_parses_offset_bone() {
        let cli = Cli::try_parse_from([
            "metarig",
            "offset-bone",
            "--rig",
            "rig.json",
            "--bone",
            "ring_sizer",
            "--out",
            "out.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::OffsetBone { ref bone, .. } if bone == "ring_sizer"));
    }
}
