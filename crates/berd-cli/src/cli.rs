//! CLI argument definitions for the BERD pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "berd",
    version,
    about = "BERD survey pipeline - outlier flagging and snapshot freezing",
    long_about = "Flag outliers in BERD survey returns and reconcile frozen snapshots.\n\n\
                  Outliers are clipped per (period, cell) group by rank. Freezing\n\
                  compares a frozen baseline with an updated snapshot, writes\n\
                  amendments and additions for review, and applies the accepted rows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix each log line with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Flag outliers in a survey table and write the flagged table.
    Outliers(OutliersArgs),

    /// Reconcile a frozen snapshot with an updated one.
    Freeze(FreezeArgs),
}

#[derive(Parser)]
pub struct OutliersArgs {
    /// Survey table (CSV) to flag.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Pipeline configuration (TOML).
    #[arg(long = "config", value_name = "TOML")]
    pub config: PathBuf,

    /// Output CSV (default: <INPUT stem>_outliers.csv beside the input).
    #[arg(long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FreezeArgs {
    #[command(subcommand)]
    pub command: FreezeCommand,
}

#[derive(Subcommand)]
pub enum FreezeCommand {
    /// Compute amendments and additions and write them for review.
    Review(ReviewArgs),

    /// Apply the reviewed amendments and additions to the baseline.
    Apply(ApplyArgs),
}

/// Options shared by both freezing stages.
#[derive(Args)]
pub struct RunArgs {
    /// Pipeline configuration (TOML).
    #[arg(long = "config", value_name = "TOML")]
    pub config: PathBuf,

    /// Directory holding the review files.
    #[arg(long = "review-dir", value_name = "DIR")]
    pub review_dir: PathBuf,

    /// Run number used in review file names.
    #[arg(long = "run-id", value_name = "N", default_value_t = 1)]
    pub run_id: u32,

    /// Run date used in review file names, as yy-mm-dd (default: today).
    ///
    /// Pass the review date when applying on a later day.
    #[arg(long = "date", value_name = "YY-MM-DD")]
    pub date: Option<String>,
}

#[derive(Parser)]
pub struct ReviewArgs {
    /// Frozen baseline snapshot (CSV).
    #[arg(value_name = "BASELINE")]
    pub baseline: PathBuf,

    /// Updated snapshot (CSV).
    #[arg(value_name = "UPDATED")]
    pub updated: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Frozen baseline snapshot (CSV).
    #[arg(value_name = "BASELINE")]
    pub baseline: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,

    /// Output CSV (default: <BASELINE stem>_frozen.csv beside the baseline).
    #[arg(long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
