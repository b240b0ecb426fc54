//! Top-level application orchestration.
//!
//! `src/main.rs` only maps errors to exit codes; this module is the real main:
//! it parses arguments, resolves settings, runs one read operation and prints
//! the result as JSON.

use clap::Parser;
use log::LevelFilter;
use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::error::Result;

pub mod service;

pub use service::MmmService;

/// Entry point for the `mmm` binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = resolve_settings(&cli)?;
    let service = MmmService::from_settings(&settings);
    log::debug!("using model artifact {}", service.path().display());

    match cli.command {
        Command::Channels => print_json(&service.channel_names()?),
        Command::Contribution(args) => print_json(&service.contribution_data(args.channel.as_deref())?),
        Command::Curves(args) => print_json(&service.response_curves(args.channel.as_deref())?),
        Command::Summary(args) => print_json(&service.channel_summary(args.channel.as_deref())?),
        Command::Info => print_json(&service.model_info()?),
    }
}

/// Environment settings with command-line overrides applied.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(path) = &cli.model {
        settings.model_path = path.clone();
    }
    if let Some(seed) = cli.seed {
        settings.synthetic_seed = seed;
    }
    Ok(settings)
}

/// `RUST_LOG` wins when set; otherwise `-v` raises the level from `warn`.
fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(verbose));
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // Ignored if a logger is already installed.
    let _ = builder.format_timestamp_millis().try_init();
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from(["mmm", "--model", "override.json", "--seed", "3", "info"]);
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.model_path, std::path::PathBuf::from("override.json"));
        assert_eq!(settings.synthetic_seed, 3);
    }
}
