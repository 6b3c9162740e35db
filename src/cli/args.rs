//! Command-line interface definitions.

use clap::{ColorChoice, Parser, ValueEnum};
use std::path::PathBuf;

/// stamp asset build tool CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path (default: stamp.toml)
    #[arg(short = 'C', long, default_value = "stamp.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Build mode; omit to only regenerate development includes
    #[arg(value_enum)]
    pub mode: Option<Mode>,
}

/// Build-and-publish modes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build, minify and publish, without pushing to the remote
    Test,
    /// Build, minify, publish and push to the configured remote
    Push,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_absent_defaults_to_dev() {
        let cli = Cli::parse_from(["stamp"]);
        assert_eq!(cli.mode, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_mode_test() {
        let cli = Cli::parse_from(["stamp", "test"]);
        assert_eq!(cli.mode, Some(Mode::Test));
    }

    #[test]
    fn test_mode_push_with_flags() {
        let cli = Cli::parse_from(["stamp", "-v", "-C", "custom.toml", "push"]);
        assert_eq!(cli.mode, Some(Mode::Push));
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }
}
