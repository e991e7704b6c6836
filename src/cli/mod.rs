//! CLI module for the npmx API
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server
//! - `fetch`: perform one cached fetch and print the result
//! - `cache`: inspect, purge or clear cached entries

pub mod cache;
pub mod fetch;
pub mod serve;

use clap::{Parser, Subcommand};

/// npmx API - cached data layer for npmx.dev
#[derive(Parser)]
#[command(name = "npmx-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve(serve::ServeArgs),

    /// Fetch a URL through the configured cache
    Fetch(fetch::FetchArgs),

    /// Inspect or maintain the configured cache
    Cache(cache::CacheArgs),
}
