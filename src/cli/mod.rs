//! CLI module for the knowledge base sync and search server
//!
//! Subcommands:
//! - `serve`: run the HTTP server with both ends of the sync session
//! - `fingerprint`: print the snapshot the configured bases would produce

pub mod fingerprint;
pub mod serve;

use clap::{Parser, Subcommand};

/// Knowledge base replication and search server
#[derive(Parser)]
#[command(name = "kb-sync-search")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Print the selection signature and fingerprint of the configured bases
    Fingerprint,
}
