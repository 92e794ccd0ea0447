use anyhow::{ensure, Result};
use std::thread;
use std::time::{Duration, Instant};

use super::{init_interfaces, open_rig, print_universes};
use crate::cli::RunArgs;
use crate::config::OutputConfig;

#[derive(Debug, Default, PartialEq, Eq)]
struct RunTotals {
    frames: u64,
    sends: usize,
    throttled: usize,
    failures: usize,
}

pub fn handle(args: &RunArgs, output: &OutputConfig) -> Result<()> {
    let fps = args.fps.unwrap_or(output.fps);
    ensure!(fps > 0, "Frame rate must be at least 1 fps");
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(fps));

    let (rig, patch, _report) = open_rig(&args.rig)?;
    if !args.dry_run {
        init_interfaces(&patch);
    }

    tracing::info!(
        "Running {} devices at {} fps{}",
        rig.devices.len(),
        fps,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let mut totals = RunTotals::default();
    while args.frames.map_or(true, |limit| totals.frames < limit) {
        let started = Instant::now();

        let cycle = patch.update(rig.devices.iter());
        totals.frames += 1;
        totals.sends += cycle.dispatch.sent;
        totals.throttled += cycle.dispatch.throttled;
        totals.failures += cycle.dispatch.failures.len();

        if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        } else {
            tracing::trace!("Frame {} overran {:?}", totals.frames, frame_time);
        }
    }

    if args.dry_run {
        print_universes(&patch);
    }
    patch.close();

    println!(
        "{} frames, {} sends, {} throttled, {} failures",
        totals.frames, totals.sends, totals.throttled, totals.failures
    );
    Ok(())
}
