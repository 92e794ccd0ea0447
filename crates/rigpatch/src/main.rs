//! Rigpatch - DMX512 patching and output for lighting rigs
//!
//! Loads a rig file (devices plus their DMX patch), encodes device
//! parameters into universes and drives Art-Net, sACN, KiNet, Enttec USB Pro
//! or loopback interfaces.

mod cli;
mod commands;
mod config;
mod logging_setup;

use anyhow::Result;
use clap::Parser;

use crate::cli::{verbosity_level, Cli};
use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(level) = verbosity_level(cli.verbose) {
        config.log.level = level.to_string();
    }

    // Held until exit so buffered file output is flushed
    let _log_guard = logging_setup::init(&config.log)?;

    commands::dispatch(cli.command, &config)
}
