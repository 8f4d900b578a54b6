//! Pokedex CLI - Explore the Pokemon world from your terminal
//!
//! An interactive shell that pages through PokeAPI location areas, explores
//! them and lets you catch and inspect Pokemon. API responses are held in an
//! in-memory expiring cache for the lifetime of the process.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pokedex::app::Session;
use pokedex::cache::ExpiringCache;
use pokedex::cli::{Cli, StartupConfig};
use pokedex::data::PokeApiClient;
use pokedex::repl::{history_path, Repl};

/// Sets up logging to stderr so it never interleaves with command output
fn init_tracing(config: &StartupConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate and create startup config
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);
    tracing::debug!(?config, "starting");

    // One cache for the whole process, handed to everything that fetches
    let cache = ExpiringCache::new(config.cache_interval)?;
    let client = PokeApiClient::new(cache, config.api_url.clone());
    let session = Session::new(client);

    let history = if config.history { history_path() } else { None };
    let mut repl = Repl::new(session, history)?;
    repl.run().await?;

    Ok(())
}
