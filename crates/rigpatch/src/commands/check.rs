use anyhow::{bail, Result};
use rigpatch_control::dmx::DeviceOutcome;

use super::{open_rig, print_universes};
use crate::cli::CheckArgs;

pub fn handle(args: &CheckArgs) -> Result<()> {
    let (rig, patch, report) = open_rig(&args.rig)?;

    println!(
        "{}: {} interfaces, {} profiles, {} assignments, {} patched devices",
        rig.metadata.name.as_deref().unwrap_or("rig"),
        report.interfaces,
        report.profiles,
        report.assignments,
        report.devices
    );

    for id in patch.interface_ids() {
        let kind = patch
            .interface_config(&id)
            .map(|config| config.kind())
            .unwrap_or("?");
        println!("  interface {} ({}) -> {:?}", id, kind, patch.interface_universes(&id));
    }
    for name in patch.profile_names() {
        let footprint = patch.profile_footprint(&name).unwrap_or(0);
        println!("  profile {} ({} channels)", name, footprint);
    }

    // Encode once without opening any interface
    let cycle = patch.update(rig.devices.iter());
    let mut problems = report.errors.len();
    for (device, outcome) in &cycle.devices {
        match outcome {
            DeviceOutcome::Encoded(summary) => {
                if !summary.missing.is_empty() {
                    println!("  device {}: missing {}", device, summary.missing.join(", "));
                }
                for mismatch in &summary.mismatches {
                    println!("  device {}: {}: {}", device, mismatch.param, mismatch.error);
                    problems += 1;
                }
            }
            DeviceOutcome::Skipped(reason) => println!("  device {}: skipped, {}", device, reason),
            DeviceOutcome::Failed(error) => {
                println!("  device {}: {}", device, error);
                problems += 1;
            }
        }
    }
    for error in &report.errors {
        println!("  rejected: {}", error);
    }

    if args.dump {
        print_universes(&patch);
    }

    if problems > 0 {
        bail!("{} found {} problem(s)", args.rig.display(), problems);
    }
    println!("{} encoded cleanly", cycle.encoded());
    Ok(())
}
