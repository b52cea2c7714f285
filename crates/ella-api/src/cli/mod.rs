//! CLI command definitions for the `ella` binary.
//!
//! `ella serve` runs the HTTP API and job worker. The remaining commands
//! are operator tools that work directly on the database.

pub mod jobs;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Ella chat backend.
#[derive(Parser)]
#[command(name = "ella", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API and the background job worker.
    Serve {
        /// Port to listen on (defaults to the configured port).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host address to bind to (defaults to the configured host).
        #[arg(long)]
        host: Option<String>,

        /// Export spans through OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Manage users and their plans.
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Inspect background job runs.
    Jobs {
        #[command(subcommand)]
        action: jobs::JobsCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
