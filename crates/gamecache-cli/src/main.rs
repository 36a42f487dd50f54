//! gamecache - a command-line front end for a remote game catalog.
//!
//! Every command loads the catalog cache-first, runs one operation through
//! the core `CatalogCache`, and prints the result.

mod commands;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gamecache_core::{CatalogCache, Config};

#[derive(Debug, Parser)]
#[command(name = "gamecache", version, about = "Browse and edit a game catalog - works offline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List games, optionally filtered by category and/or title
    List {
        /// Exact category name
        #[arg(long, default_value = "")]
        category: String,
        /// Case-insensitive title search
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List categories
    Categories,
    /// List favorite games
    Favorites,
    /// Show one game
    Show { id: String },
    /// Add a game to the catalog
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        price: String,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Edit a game; unspecified fields keep their current value
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a game (also removes it from favorites)
    Delete { id: String },
    /// Toggle a game in the favorites
    Favorite { id: String },
    /// Remove a game from the favorites
    Unfavorite { id: String },
    /// Re-fetch the catalog from the remote service
    Refresh,
    /// Save the catalog API base URL to the config file
    SetUrl { url: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    // Runs before the cache is built so a missing URL can be configured
    if let Command::SetUrl { url } = &cli.command {
        let path = Config::set_api_base_url(url)?;
        println!("API base URL saved to {}", path.display());
        return Ok(());
    }

    let config = Config::load()?;
    let cache = CatalogCache::from_config(&config)?;

    let report = cache.populate().await;
    info!(source = ?report.source, failures = report.failures.len(), "Catalog loaded");
    for failure in &report.failures {
        eprintln!("Warning: {}", failure);
    }

    commands::run(&cache, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from(["gamecache", "list", "--category", "RPG", "--search", "mar"])
            .expect("list should parse");
        match cli.command {
            Command::List { category, search } => {
                assert_eq!(category, "RPG");
                assert_eq!(search, "mar");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_keeps_unset_fields_empty() {
        let cli = Cli::try_parse_from(["gamecache", "update", "5", "--price", "19.5"])
            .expect("update should parse");
        match cli.command {
            Command::Update { id, price, title, .. } => {
                assert_eq!(id, "5");
                assert_eq!(price, Some(19.5));
                assert!(title.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_set_url() {
        let cli = Cli::try_parse_from(["gamecache", "set-url", "https://catalog.test"])
            .expect("set-url should parse");
        match cli.command {
            Command::SetUrl { url } => assert_eq!(url, "https://catalog.test"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
