//! Command-line parsing for the MMM inspection tool.
//!
//! Parsing lives here; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mmm", version, about = "Marketing-mix model insights (contributions, curves, summaries)")]
pub struct Cli {
    /// Trained model artifact. Overrides `MMM_MODEL_PATH`.
    #[arg(long, global = true, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Seed for the synthetic fallback model. Overrides `MMM_SYNTHETIC_SEED`.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands. Each prints its result as pretty JSON.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List channel names in model order.
    Channels,
    /// Per-period contribution series with summary statistics.
    Contribution(ChannelArgs),
    /// Response (saturation) curves.
    Curves(ChannelArgs),
    /// Spend, contribution, share and efficiency per channel.
    Summary(ChannelArgs),
    /// Describe the loaded model.
    Info,
}

#[derive(Debug, Parser, Clone)]
pub struct ChannelArgs {
    /// Restrict output to one channel.
    #[arg(short, long)]
    pub channel: Option<String>,
}
