use anyhow::{Context, Result};
use rigpatch_io::load_rig;

use crate::cli::ConvertArgs;

pub fn handle(args: &ConvertArgs) -> Result<()> {
    let mut rig = load_rig(&args.input)
        .with_context(|| format!("Failed to load rig {}", args.input.display()))?;
    rig.save(&args.output)
        .with_context(|| format!("Failed to write rig {}", args.output.display()))?;

    println!("{} -> {}", args.input.display(), args.output.display());
    Ok(())
}
