//! CLI module for notecrew
//!
//! Provides command-line interface parsing for the notecrew-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// notecrew - a research note-taking crew
///
/// Five LLM agents research, fact check, summarize, organize and write notes
/// on a topic, one after another.
#[derive(Parser, Debug)]
#[command(
    name = "notecrew-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "notecrew - research notes from a crew of LLM agents",
    long_about = "Runs a sequential crew of five LLM agents (research, fact check, summarize,\n\
                  organize, take notes) over a topic and serves the result on a single web page.\n\n\
                  Run without arguments to start the server, or use 'run' for a one-off topic.",
    after_help = "EXAMPLES:\n    \
                  notecrew-server init                  # Write notecrew.toml and .env.example\n    \
                  notecrew-server                       # Start the web server\n    \
                  notecrew-server run \"Quantum sensing\"  # Run the crew once and print the notes\n    \
                  notecrew-server config --validate     # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "notecrew.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (the default)
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the crew once for a topic and print the final notes
    Run {
        /// Research topic
        topic: String,
    },

    /// Write a starter notecrew.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8501")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration and the environment it references
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
