//! Cocktail-Mirror: a polite local mirror of a public cocktail recipe API
//!
//! This crate walks the upstream API's enumeration space, downloads cocktail and
//! ingredient records plus their images under a fixed rate limit, persists them
//! into SQLite with idempotent upserts, checkpoints progress so interrupted runs
//! resume where they stopped, and exports a denormalized JSON snapshot.

pub mod config;
pub mod crawler;
pub mod ledger;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Cocktail-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Cocktail-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_pipeline, Coordinator, RunSummary};
pub use ledger::{ProgressLedger, WorkKind};
pub use storage::{SqliteStorage, Storage};
