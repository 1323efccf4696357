//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;
use crate::score::RollupPolicy;

/// Surveyflow - validate survey branching logic and scoring setups.
#[derive(Parser)]
#[command(name = "surveyflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SURVEYFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate survey flow and scoring setup
    #[command(alias = "check")]
    Validate(ValidateArgs),

    /// Compute an itemized score for one set of answers
    #[command(alias = "score")]
    Trace(TraceArgs),

    /// Print the question flow graph
    Graph(SurveyArgs),

    /// Classify which analytics views can render
    Classify(ClassifyArgs),
}

/// Arguments naming a survey document.
#[derive(Args)]
pub struct SurveyArgs {
    /// Survey document (.json or .toml)
    pub survey: PathBuf,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub survey: SurveyArgs,

    /// Exit with an error when the survey cannot be published
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct TraceArgs {
    #[command(flatten)]
    pub survey: SurveyArgs,

    /// Answers document mapping question ids to answer values
    #[arg(short, long)]
    pub answers: PathBuf,

    /// Overall rollup policy (overrides config)
    #[arg(long, value_enum)]
    pub rollup: Option<RollupPolicy>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Analytics input document (.json or .toml)
    pub input: PathBuf,
}
