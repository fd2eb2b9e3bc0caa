//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hyqa",
    version,
    author = "neur0map",
    about = "Answer questions over a relational dataset and its article corpus",
    long_about = "hyqa decomposes a question into read-only SQL subqueries, runs a hybrid semantic and \
                  keyword search over a companion article corpus, and synthesizes one grounded answer \
                  from both result sets."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/hyqa/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question
    Ask {
        /// Question to ask
        question: String,

        /// Number of hits kept per text search channel
        #[arg(short = 'k', long)]
        top_k: Option<NonZeroUsize>,

        /// Print the SQL decomposition trace
        #[arg(long)]
        debug_sql: bool,

        /// Print the text search trace
        #[arg(long)]
        debug_text: bool,

        /// Print the whole turn as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive question loop
    Chat {
        /// Number of hits kept per text search channel
        #[arg(short = 'k', long)]
        top_k: Option<NonZeroUsize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
