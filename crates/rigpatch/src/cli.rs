//! Command-line arguments

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rigpatch", version, about = "DMX512 patching and output for lighting rigs")]
pub struct Cli {
    /// Application config file
    #[arg(
        long,
        short,
        global = true,
        env = "RIGPATCH_CONFIG",
        default_value = "rigpatch.toml"
    )]
    pub config: PathBuf,

    /// Raise log verbosity (-v debug, -vv trace); overrides the config file
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a rig, report rejected bindings and encode every device once
    Check(CheckArgs),
    /// Rewrite a rig file in another format (by extension)
    Convert(ConvertArgs),
    /// Push raw bytes to one universe
    Raw(RawArgs),
    /// Drive the rig's interfaces at a fixed frame rate
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Rig file (.json, .ron or .rig)
    pub rig: PathBuf,

    /// Print the resulting universes
    #[arg(long)]
    pub dump: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct RawArgs {
    pub rig: PathBuf,

    /// Target universe
    #[arg(long, short)]
    pub universe: u32,

    /// Byte written to every channel
    #[arg(long, conflicts_with = "file", default_value_t = 0)]
    pub value: u8,

    /// File holding exactly 512 bytes
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Update the buffer without opening any interface
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    pub rig: PathBuf,

    /// Frames per second; defaults to `output.fps` from the config file
    #[arg(long)]
    pub fps: Option<u32>,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Encode without opening any interface, then print the universes
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level forced by `-v` flags, if any
pub fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli =
            Cli::try_parse_from(["rigpatch", "-vv", "run", "show.rig", "--fps", "30"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("rigpatch.toml"));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.rig, PathBuf::from("show.rig"));
                assert_eq!(args.fps, Some(30));
                assert_eq!(args.frames, None);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_raw_value_conflicts_with_file() {
        let result = Cli::try_parse_from([
            "rigpatch", "raw", "show.rig", "-u", "1", "--value", "255", "--file", "frame.bin",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some("debug"));
        assert_eq!(verbosity_level(5), Some("trace"));
    }
}
