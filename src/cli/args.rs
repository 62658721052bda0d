//! CLI argument definitions.
//!
//! All Clap derive structs for `progression` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Behavior progression engine for character simulation.
#[derive(Parser, Debug)]
#[command(name = "progression", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "PROGRESSION_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a conversation transcript through the engine.
    Simulate(SimulateArgs),

    /// Validate configuration files without running anything.
    Validate(ValidateArgs),
}

// ============================================================================
// Simulate Command
// ============================================================================

/// Arguments for `simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to YAML configuration file (built-in config when omitted).
    #[arg(short, long, env = "PROGRESSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Transcript file: one message per line. A `+<hours>h ` prefix on a
    /// line injects a response gap before that message.
    #[arg(short, long)]
    pub transcript: PathBuf,

    /// Character id the transcript is attributed to.
    #[arg(long, default_value = "character-1")]
    pub character: String,

    /// Behavior types to activate (wire names, e.g. `YANDERE_OBSESSIVE`).
    #[arg(short, long, required = true, num_args = 1.., value_delimiter = ',')]
    pub behaviors: Vec<String>,

    /// Minutes of simulated time between consecutive messages.
    #[arg(long, default_value_t = 5)]
    pub interval_minutes: u32,

    /// Expose Prometheus metrics on `127.0.0.1:<port>` during the run.
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Validate Command
// ============================================================================

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
