//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `StartupConfig` (cache interval, API URL, logging, history).

use clap::Parser;
use std::time::Duration;
use thiserror::Error;

use crate::data::POKEAPI_BASE_URL;

/// Default cache expiry interval in seconds
pub const DEFAULT_CACHE_INTERVAL_SECS: u64 = 10;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A zero interval would make the cache reaper spin
    #[error("Invalid cache interval: must be at least 1 second")]
    ZeroCacheInterval,

    /// The API URL is not an http(s) URL
    #[error("Invalid API URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidApiUrl(String),
}

/// Pokedex CLI - Explore location areas and catch Pokemon from the PokeAPI
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Interactive Pokedex backed by the PokeAPI")]
#[command(version)]
pub struct Cli {
    /// How long API responses stay cached, in seconds
    #[arg(long, value_name = "SECONDS", env = "POKEDEX_CACHE_INTERVAL", default_value_t = DEFAULT_CACHE_INTERVAL_SECS)]
    pub cache_interval: u64,

    /// Base URL of the PokeAPI
    #[arg(long, value_name = "URL", env = "POKEDEX_API_URL", default_value = POKEAPI_BASE_URL)]
    pub api_url: String,

    /// Enable debug logging (cache hits and misses, commands)
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not load or save the line-editor history
    #[arg(long)]
    pub no_history: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Cache expiry interval and reaper period
    pub cache_interval: Duration,
    /// Base URL for API requests
    pub api_url: String,
    /// Whether debug logging is enabled
    pub verbose: bool,
    /// Whether REPL history is persisted
    pub history: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache_interval: Duration::from_secs(DEFAULT_CACHE_INTERVAL_SECS),
            api_url: POKEAPI_BASE_URL.to_string(),
            verbose: false,
            history: true,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the interval is zero or the URL is not http(s)
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_interval == 0 {
            return Err(CliError::ZeroCacheInterval);
        }
        if !(cli.api_url.starts_with("http://") || cli.api_url.starts_with("https://")) {
            return Err(CliError::InvalidApiUrl(cli.api_url.clone()));
        }

        Ok(StartupConfig {
            cache_interval: Duration::from_secs(cli.cache_interval),
            api_url: cli.api_url.clone(),
            verbose: cli.verbose,
            history: !cli.no_history,
        })
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "pokedex=debug"
        } else {
            "pokedex=warn"
        }
    }
}
