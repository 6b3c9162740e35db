//! stamp - versioning, minifying, remote-pushing asset build tool.

mod asset;
mod cli;
mod config;
mod includes;
mod logger;
mod pipeline;
mod publish;
mod remote;
mod utils;
mod version;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::BuildConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = BuildConfig::load(&cli)?;
    pipeline::run_mode(cli.mode, config)
}
