//! Command-line interface for inspecting and editing a registry.
//!
//! Every command prints pretty JSON on stdout.

pub mod commands;

use clap::{Parser, Subcommand};

/// Persistent configuration registry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the registry's own config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to the store database (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show every category with current and default values
    Summary,

    /// Show one setting by name
    Get {
        name: String,
    },

    /// Update one setting; VALUE is parsed as JSON, else taken as text
    Set {
        name: String,
        value: String,
    },

    /// Re-read every setting from the store
    Refresh,

    /// Show one category as a tree
    View {
        category: String,

        /// Keep redundant wrapper levels
        #[arg(long)]
        nested: bool,
    },

    /// Dump stored values
    Dump {
        /// Limit to one category
        #[arg(long)]
        category: Option<String>,

        /// Use dotted paths instead of a tree
        #[arg(long)]
        flat: bool,
    },

    /// List loaded categories
    Categories,
}
