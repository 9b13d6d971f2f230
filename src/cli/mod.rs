//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Inspect the content store kept in sync by content-sync
#[derive(Parser, Debug)]
#[command(name = "csync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (default: nearest directory containing .contentsync/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Store path (default: <project>/.contentsync/store.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Collection to operate on (default: from config, else "default")
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,

    /// Show resolved configuration and store statistics
    Status,

    /// Inspect stored entries
    Entries {
        #[command(subcommand)]
        command: EntriesCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Entries Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum EntriesCommands {
    /// List stored entries
    List,

    /// Show one entry
    Get {
        /// Entry ID
        id: String,
    },

    /// Delete one entry
    Delete {
        /// Entry ID
        id: String,
    },
}

/// Global options shared by store-backed commands.
#[derive(Debug, Clone, Copy)]
pub struct StoreArgs<'a> {
    pub project: Option<&'a PathBuf>,
    pub db: Option<&'a PathBuf>,
    pub collection: Option<&'a str>,
}

impl<'a> From<&'a Cli> for StoreArgs<'a> {
    fn from(cli: &'a Cli) -> Self {
        Self {
            project: cli.project.as_ref(),
            db: cli.db.as_ref(),
            collection: cli.collection.as_deref(),
        }
    }
}
