//! Subcommand handlers

mod check;
mod convert;
mod raw;
mod run;

use anyhow::{Context, Result};
use rigpatch_control::dmx::{DmxPatch, LoadReport, TracingSink};
use rigpatch_io::{build_patch, load_rig, RigFile};
use std::path::Path;
use std::sync::Arc;

use crate::cli::Command;
use crate::config::AppConfig;

pub fn dispatch(command: Command, config: &AppConfig) -> Result<()> {
    tracing::debug!(command = ?command, "dispatching command");
    match command {
        Command::Check(args) => check::handle(&args),
        Command::Convert(args) => convert::handle(&args),
        Command::Raw(args) => raw::handle(&args),
        Command::Run(args) => run::handle(&args, &config.output),
    }
}

/// Load a rig file and build its engine, logging any rejected bindings
fn open_rig(path: &Path) -> Result<(RigFile, DmxPatch, LoadReport)> {
    let rig = load_rig(path).with_context(|| format!("Failed to load rig {}", path.display()))?;
    let (patch, report) = build_patch(&rig, Arc::new(TracingSink));

    for error in &report.errors {
        tracing::warn!("Skipped binding: {}", error);
    }
    Ok((rig, patch, report))
}

/// Open every interface, warning about the ones that fail
fn init_interfaces(patch: &DmxPatch) {
    for (id, error) in patch.init() {
        tracing::warn!("Interface '{}' stays offline: {}", id, error);
    }
}

/// Hex dump of every allocated universe
fn print_universes(patch: &DmxPatch) {
    for universe in 0..patch.universe_count() as u32 {
        if let Some(dump) = patch.describe_universe(universe) {
            println!("{}", dump);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CheckArgs, ConvertArgs, RawArgs, RunArgs};
    use crate::config::OutputConfig;
    use rigpatch_control::dmx::{
        ConversionProfile, ConversionType, DevicePatch, InterfaceConfig, LoopbackConfig,
        RigTopology,
    };
    use rigpatch_core::{Device, FloatParam};
    use rigpatch_io::save_rig;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn topology() -> RigTopology {
        RigTopology::new()
            .with_interface("bus", InterfaceConfig::Loopback(LoopbackConfig::default()))
            .with_assignment("bus", 0)
            .with_profile(
                "dimmer",
                ConversionProfile::new().with("intensity", 0, ConversionType::SingleByte),
            )
            .with_device("d1", DevicePatch::new("dimmer", 10, 0))
    }

    fn write_rig(dir: &TempDir, name: &str, topology: RigTopology) -> PathBuf {
        let devices =
            vec![Device::new("d1", "dimmer").with_param("intensity", FloatParam::new(0.5))];
        let path = dir.path().join(name);
        save_rig(&devices, &topology, &path).unwrap();
        path
    }

    fn raw_args(rig: PathBuf, universe: u32) -> RawArgs {
        RawArgs {
            rig,
            universe,
            value: 7,
            file: None,
            dry_run: true,
        }
    }

    #[test]
    fn test_check_clean_rig() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.json", topology());

        assert!(check::handle(&CheckArgs { rig, dump: true }).is_ok());
    }

    #[test]
    fn test_check_reports_rejected_binding() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.json", topology().with_assignment("ghost", 1));

        let err = check::handle(&CheckArgs { rig, dump: false }).unwrap_err();
        assert!(err.to_string().contains("1 problem"));
    }

    #[test]
    fn test_check_missing_rig() {
        let dir = tempdir().unwrap();
        let rig = dir.path().join("absent.json");

        let err = check::handle(&CheckArgs { rig, dump: false }).unwrap_err();
        assert!(err.to_string().contains("Failed to load rig"));
    }

    #[test]
    fn test_convert_json_to_ron() {
        let dir = tempdir().unwrap();
        let input = write_rig(&dir, "show.json", topology());
        let output = dir.path().join("show.ron");

        convert::handle(&ConvertArgs {
            input: input.clone(),
            output: output.clone(),
        })
        .unwrap();

        let before = load_rig(&input).unwrap();
        let after = load_rig(&output).unwrap();
        assert_eq!(before.devices, after.devices);
        assert_eq!(before.patch, after.patch);
    }

    #[test]
    fn test_raw_dry_run() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.rig", topology());

        assert!(raw::handle(&raw_args(rig, 0)).is_ok());
    }

    #[test]
    fn test_raw_unallocated_universe() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.rig", topology());

        let err = raw::handle(&raw_args(rig, 5)).unwrap_err();
        assert!(err.to_string().contains("universe 5"));
    }

    #[test]
    fn test_raw_short_file() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.rig", topology());
        let frame = dir.path().join("frame.bin");
        std::fs::write(&frame, [0u8; 100]).unwrap();

        let args = RawArgs {
            file: Some(frame),
            ..raw_args(rig, 0)
        };
        assert!(raw::handle(&args).is_err());
    }

    #[test]
    fn test_run_fixed_frames() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.json", topology());

        let args = RunArgs {
            rig,
            fps: Some(1000),
            frames: Some(3),
            dry_run: true,
        };
        assert!(run::handle(&args, &OutputConfig::default()).is_ok());
    }

    #[test]
    fn test_run_rejects_zero_fps() {
        let dir = tempdir().unwrap();
        let rig = write_rig(&dir, "show.json", topology());

        let args = RunArgs {
            rig,
            fps: None,
            frames: Some(1),
            dry_run: true,
        };
        let output = OutputConfig { fps: 0 };
        assert!(run::handle(&args, &output).is_err());
    }
}
