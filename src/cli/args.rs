//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, hierarchy::HierarchyArgs,
    import::ImportArgs, init::InitArgs, part::PartCommands, project::ProjectCommands,
    tree::TreeArgs,
};

#[derive(Parser)]
#[command(name = "partnum")]
#[command(author, version, about = "Part numbering and assembly hierarchy")]
#[command(
    long_about = "Assigns collision-free part numbers to parts and assemblies and derives \
                  their subteam and subsystem from the assembly tree."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .partnum/)
    #[arg(long, short = 'C', global = true)]
    pub workspace: Option<PathBuf>,

    /// Project prefix (default: PARTNUM_PROJECT, then default_project in config)
    #[arg(long, short = 'p', global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new partnum workspace
    Init(InitArgs),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Part and assembly management
    #[command(subcommand)]
    Part(PartCommands),

    /// Show the assembly tree of a project
    Tree(TreeArgs),

    /// List subteam and subsystem candidates
    Hierarchy(HierarchyArgs),

    /// Create parts in bulk from a CSV file
    Import(ImportArgs),

    /// Show effective configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for lists, details for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just part numbers, one per line
    Id,
}
