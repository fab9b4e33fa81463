//! Cocktail-Mirror main entry point
//!
//! This is the command-line interface for the Cocktail-Mirror recipe mirror.

use anyhow::Context;
use clap::Parser;
use cocktail_mirror::config::{resolve_config, Config};
use cocktail_mirror::crawler::Coordinator;
use cocktail_mirror::ledger::ProgressLedger;
use cocktail_mirror::output::{
    export_snapshot, format_cocktail, load_statistics, print_statistics,
};
use cocktail_mirror::storage::{open_storage, CocktailRecord, SqliteStorage, Storage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Number of matches printed by --search
const SEARCH_LIMIT: usize = 10;

/// Cocktail-Mirror: a polite local mirror of a public cocktail recipe API
///
/// Without flags, Cocktail-Mirror enumerates the upstream catalogue, downloads
/// every cocktail, ingredient and image it does not have yet, and exports a
/// JSON snapshot of the local store. Interrupted runs resume where they
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "cocktail-mirror")]
#[command(version)]
#[command(about = "A polite local mirror of a public cocktail recipe API", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults to ./cocktail-mirror.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start with an empty progress ledger instead of resuming
    #[arg(long)]
    fresh: bool,

    /// Write the JSON snapshot from the current database and exit
    #[arg(long, conflicts_with_all = ["fresh", "stats", "search", "random"])]
    export_only: bool,

    /// Show statistics from the database and ledger and exit
    #[arg(long, conflicts_with_all = ["fresh", "search", "random"])]
    stats: bool,

    /// Search the local mirror for cocktails by name and exit
    #[arg(long, value_name = "NAME", conflicts_with_all = ["fresh", "random"])]
    search: Option<String>,

    /// Print a random cocktail from the local mirror and exit
    #[arg(long, conflicts_with = "fresh")]
    random: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match resolve_config(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            match &hash {
                Some(hash) => tracing::info!("Configuration loaded (hash: {})", hash),
                None => tracing::info!("Using default configuration"),
            }
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.export_only {
        handle_export_only(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(query) = cli.search.as_deref() {
        handle_search(&config, query)
    } else if cli.random {
        handle_random(&config)
    } else {
        handle_mirror(config, config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cocktail_mirror=info,warn"),
            1 => EnvFilter::new("cocktail_mirror=debug,info"),
            2 => EnvFilter::new("cocktail_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens the local database, which must already exist
fn open_existing_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = config.output.database_path();
    if !path.exists() {
        anyhow::bail!(
            "No database at {}; run cocktail-mirror without flags first",
            path.display()
        );
    }
    open_storage(&path).with_context(|| format!("Failed to open {}", path.display()))
}

fn print_card(storage: &SqliteStorage, cocktail: &CocktailRecord) -> anyhow::Result<()> {
    let lines = storage.get_ingredient_lines(&cocktail.id)?;
    println!("{}", format_cocktail(cocktail, &lines));
    Ok(())
}

/// Handles the --export-only mode: writes the snapshot without touching the network
fn handle_export_only(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Snapshot ===\n");

    let storage = open_existing_storage(config)?;
    let cocktails_path = config.output.cocktails_export_path();
    let ingredients_path = config.output.ingredients_export_path();

    let summary = export_snapshot(&storage, &cocktails_path, &ingredients_path)?;

    println!(
        "✓ {} cocktails exported to: {}",
        summary.cocktails,
        cocktails_path.display()
    );
    println!(
        "✓ {} ingredients exported to: {}",
        summary.ingredients,
        ingredients_path.display()
    );
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database and ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path().display());

    let storage = open_existing_storage(config)?;

    let progress_path = config.output.progress_path();
    let ledger = if progress_path.exists() {
        Some(ProgressLedger::load(&progress_path)?)
    } else {
        None
    };

    let stats = load_statistics(&storage, ledger.as_ref())?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --search mode: looks up cocktails by name, then by ingredient
fn handle_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let storage = open_existing_storage(config)?;

    let mut matches = storage.search_cocktails_by_name(query, SEARCH_LIMIT)?;
    if matches.is_empty() {
        matches = storage.find_cocktails_by_ingredient(query, SEARCH_LIMIT)?;
    }

    if matches.is_empty() {
        println!("No cocktails found for '{}'", query);
        return Ok(());
    }

    for cocktail in &matches {
        print_card(&storage, cocktail)?;
    }
    Ok(())
}

/// Handles the --random mode: prints one random cocktail
fn handle_random(config: &Config) -> anyhow::Result<()> {
    let storage = open_existing_storage(config)?;

    match storage.random_cocktail()? {
        Some(cocktail) => print_card(&storage, &cocktail),
        None => {
            println!("The local mirror has no cocktails yet");
            Ok(())
        }
    }
}

/// Handles the main mirror run
async fn handle_mirror(
    config: Config,
    config_hash: Option<String>,
    fresh: bool,
) -> anyhow::Result<()> {
    tracing::info!("Data directory: {}", config.output.data_dir.display());
    tracing::info!(
        "Request delay: {}ms, image delay: {}ms",
        config.rate_limit.request_delay_ms,
        config.rate_limit.image_delay_ms
    );

    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.bind_config_hash(config_hash.as_deref());

    match coordinator.run().await {
        Ok(summary) => {
            tracing::info!(
                "Mirror run completed: {} cocktails and {} ingredients exported",
                summary.snapshot.cocktails,
                summary.snapshot.ingredients
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror run failed: {}", e);
            Err(e.into())
        }
    }
}
