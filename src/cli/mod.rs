//! CLI module for Convene
//!
//! Command-line parsing for the convene-server binary, with clap for arguments
//! and owo-colors for terminal output.

pub mod output;

use crate::types::SessionMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Convene - concurrent multi-domain investigation server
#[derive(Parser, Debug)]
#[command(
    name = "convene-server",
    version,
    about = "Convene - concurrent multi-domain investigation server",
    long_about = "Runs panels of domain agents (biology, chemistry, genomics, clinical,\n\
                  literature) against public scientific data sources and streams their\n\
                  work as live events.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  convene-server                                   # Start the server\n    \
                  convene-server --config my.toml serve            # Use a custom config file\n    \
                  convene-server run --topic \"BRCA1\" --mode molecular\n    \
                  convene-server config --validate                 # Check convene.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "convene.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output (forces debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Run one session locally and print each event as a JSON line
    Run {
        /// Research topic
        #[arg(short, long)]
        topic: String,

        /// Participant mode (broad, molecular, translational, evidence)
        #[arg(short, long, default_value = "broad")]
        mode: SessionMode,

        /// Override the number of participating agents
        #[arg(short, long)]
        participants: Option<usize>,

        /// Also print heartbeat frames
        #[arg(long)]
        heartbeats: bool,
    },

    /// List agent domains and their tool pools
    Domains,

    /// List registered data sources
    Tools,

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `serve` when none was given.
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
