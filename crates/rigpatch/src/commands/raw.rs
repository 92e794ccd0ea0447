use anyhow::{Context, Result};
use rigpatch_control::dmx::DMX_UNIVERSE_SIZE;
use std::fs;

use super::{init_interfaces, open_rig};
use crate::cli::RawArgs;

pub fn handle(args: &RawArgs) -> Result<()> {
    let data = match &args.file {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => vec![args.value; DMX_UNIVERSE_SIZE],
    };

    let (_rig, patch, _report) = open_rig(&args.rig)?;
    if !args.dry_run {
        init_interfaces(&patch);
    }

    let report = patch
        .set_raw_data(args.universe, &data)
        .with_context(|| format!("Failed to set universe {}", args.universe))?;

    println!(
        "universe {}: {} sends, {} failures",
        args.universe,
        report.sent,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {}: {}", failure.interface, failure.error);
    }
    if let Some(dump) = patch.describe_universe(args.universe) {
        print!("{}", dump);
    }

    patch.close();
    Ok(())
}
