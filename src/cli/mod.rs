//! Command-line interface for Fanvault.

mod commands;

use clap::{Parser, Subcommand};

use crate::models::Platform;

/// Fanvault - multi-platform K-pop fan media search
#[derive(Parser)]
#[command(name = "fanvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API and the expiry sweep scheduler (default)
    #[command(alias = "daemon")]
    Serve,

    /// Delete expired cache rows and watermarks once
    Sweep,

    /// Search the configured platforms through the cache
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,

        /// Restrict to a platform (repeatable)
        #[arg(long = "platform", short = 'p')]
        platforms: Vec<Platform>,

        /// Record watermarks for this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
