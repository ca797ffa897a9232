//! CLI command definitions and dispatch for the `casework` binary.
//!
//! Uses clap derive macros for argument parsing. Resource commands follow a
//! noun-verb pattern (e.g., `casework user create`, `casework list cases`).

pub mod case;
pub mod classify;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Case-study practice server and admin tools.
#[derive(Parser)]
#[command(name = "casework", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to server.port from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to server.host from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Export spans to stdout via OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Import agents and cases from a TOML catalogue.
    Import {
        /// Path to the catalogue file.
        file: PathBuf,
    },

    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show how a percentage score would be classified.
    Classify {
        /// Assessment percentage (values outside 0-100 are clamped).
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user on the free plan and print its access token.
    Create {
        /// Contact email (optional, must be unique).
        email: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List all cases.
    Cases,
}
