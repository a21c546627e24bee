//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tracelink - requirements traceability linking and gap analysis.
#[derive(Debug, Parser)]
#[command(name = "tracelink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ./tracelink.toml, then the user config dir)
    #[arg(short, long, global = true, env = "TRACELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress the human summary on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split system requirements into atomic parts
    Decompose(DecomposeArgs),

    /// Establish links between artifact layers
    Link(LinkArgs),

    /// Analyze coverage and gaps for an existing link set
    Analyze(AnalyzeArgs),

    /// Decompose, link, then analyze the resulting links
    Run(RunArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the decompose command.
#[derive(Debug, Args)]
pub struct DecomposeArgs {
    /// JSON file holding an array of artifacts
    #[arg(short, long)]
    pub artifacts: PathBuf,

    /// Write the decomposed artifacts here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the link command.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// JSON file holding an array of artifacts
    #[arg(short, long)]
    pub artifacts: PathBuf,

    /// Write links here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Replace configured linking and analysis thresholds with a preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// JSON file holding an array of artifacts
    #[arg(short, long)]
    pub artifacts: PathBuf,

    /// JSON file holding an array of links
    #[arg(short, long)]
    pub links: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Ask the LLM to explain each gap (requires `[llm] enabled = true`)
    #[arg(long)]
    pub explain: bool,
}

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON file holding an array of artifacts
    #[arg(short, long)]
    pub artifacts: PathBuf,

    /// Also write the decomposed artifacts to this file
    #[arg(long)]
    pub artifacts_out: Option<PathBuf>,

    /// Also write the links to this file
    #[arg(long)]
    pub links_out: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Replace configured linking and analysis thresholds with a preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Ask the LLM to explain each gap (requires `[llm] enabled = true`)
    #[arg(long)]
    pub explain: bool,
}

/// Arguments for the config command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Print the built-in defaults rather than the loaded file
    #[arg(long)]
    pub defaults: bool,

    /// Write the printed configuration to this file
    #[arg(short, long)]
    pub write: Option<PathBuf>,
}

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Default thresholds
    Default,
    /// Higher thresholds, corroborated evidence only
    Strict,
    /// Lower thresholds for sparse corpora
    Permissive,
}
