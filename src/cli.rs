use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crpm-check")]
#[command(about = "Check rate-plan accounting settings against hotel standards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the compliance check and write reports
    Check(CheckArgs),
    /// Write a default crpm.toml and an exceptions template
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Show or validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,

        /// Configuration file (default: ./crpm.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Rate-plan workbook (.xlsx) or CSV file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Exceptions file (.toml, .csv or workbook)
    #[arg(short, long)]
    pub exceptions: Option<PathBuf>,

    /// Standards CSV when the input is a CSV file
    #[arg(long)]
    pub standards: Option<PathBuf>,

    /// Base directory for report folders
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (default: ./crpm.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Terminal output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Minimum occurrences before a new rule is suggested
    #[arg(long)]
    pub min_occurrences: Option<usize>,

    /// Skip the HTML dashboard
    #[arg(long)]
    pub no_dashboard: bool,

    /// Do not open the dashboard in a browser
    #[arg(long)]
    pub no_open: bool,

    /// Exit with code 0 even when High priority issues remain
    #[arg(long)]
    pub exit_zero: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
