//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    init::InitArgs,
    records::{CreateArgs, DeleteArgs, GetArgs, ListArgs, UpdateArgs},
    uom::UomCommands,
};

#[derive(Parser)]
#[command(name = "stockwise")]
#[command(author, version, about = "Business records repository with unit-of-measure conversion")]
#[command(long_about = "Maintenance front-end for a stockwise database: list, inspect and edit records of every entity kind, and manage unit-of-measure categories.")]
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

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Database file (default: from config, then the platform data directory)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database (or check an existing one)
    Init(InitArgs),

    /// List entity kinds with their search, sort and delete behaviour
    Kinds,

    /// List records of one kind
    List(ListArgs),

    /// Show one record, active or not
    Get(GetArgs),

    /// Create a record from JSON fields
    Create(CreateArgs),

    /// Change fields of a record (absent fields are kept)
    Update(UpdateArgs),

    /// Deactivate a record, or remove it for kinds without an active flag
    Delete(DeleteArgs),

    /// Unit-of-measure categories, units and conversion
    #[command(subcommand)]
    Uom(UomCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for get, table for list)
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
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    pub fn is_auto(&self) -> bool {
        *self == OutputFormat::Auto
    }
}
