//! Command line argument parsing for the Falchion CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Falchion - in-memory postings accumulation for index construction
#[derive(Parser, Debug, Clone)]
#[command(name = "falchion")]
#[command(about = "Build sorted postings runs from plain-text documents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FalchionArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FalchionArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index text files into postings runs, one document per line
    Build(BuildArgs),

    /// Decode a run file and summarize its records
    Inspect(InspectArgs),
}

/// Arguments for building runs
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Input text files
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory the run files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Postings configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Stemming applied to every term
    #[arg(long, default_value = "none")]
    pub stem: StemMode,

    /// Drop English stop words from the runs
    #[arg(long)]
    pub stop: bool,

    /// Additional stop word file, one word per line
    #[arg(long, value_name = "STOP_FILE", requires = "stop")]
    pub stop_file: Option<PathBuf>,

    /// Write document counts only, without word positions
    #[arg(long)]
    pub no_offsets: bool,
}

/// Arguments for inspecting a run
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Run file to decode
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,

    /// Maximum number of records to list
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Decode postings as counts only (for runs built with --no-offsets)
    #[arg(long)]
    pub counts: bool,
}

/// Stemming modes available in CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemMode {
    /// Keep terms as tokenized
    None,
    /// Strip common English suffixes
    Simple,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
