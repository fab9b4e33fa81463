//! Storage module for persisting the recipe mirror
//!
//! This module handles all database operations for the mirror, including:
//! - SQLite database initialization and schema management
//! - Cocktail and ingredient upserts keyed by their external identity
//! - Replace-all-children semantics for a cocktail's ingredient lines
//! - Read paths used by the snapshot exporter and local lookups

mod schema;
mod sqlite;
mod traits;

pub use schema::{get_schema_version, initialize_schema};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::MirrorError;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(MirrorError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, MirrorError> {
    SqliteStorage::new(path)
}

/// A cocktail row
///
/// Field names match the `cocktails` columns, which is also the shape the
/// snapshot exporter emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CocktailRecord {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub alcoholic: Option<String>,
    pub glass: Option<String>,
    pub instructions: Option<String>,
    pub instructions_ru: Option<String>,
    pub instructions_de: Option<String>,
    pub instructions_fr: Option<String>,
    pub instructions_es: Option<String>,
    pub instructions_it: Option<String>,
    pub image_url: Option<String>,
    pub image_local_path: Option<String>,
    pub tags: Option<String>,
    pub video_url: Option<String>,
    pub iba: Option<String>,
    pub date_modified: Option<String>,
    /// Upstream payload, serialized verbatim
    pub raw_json: String,
    /// Set by the database on first insert
    pub created_at: Option<String>,
}

/// One ingredient line of a cocktail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    /// Source slot (1..=15); defines display order
    pub position: u32,
    pub ingredient: String,
    pub measure: Option<String>,
}

/// An ingredient row, keyed by ingredient name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientRecord {
    /// Identity key: the ingredient name as enumerated upstream
    pub id: String,
    pub name: String,
    /// Upstream numeric id; informational, not guaranteed stable
    pub source_id: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub alcohol: Option<String>,
    pub abv: Option<String>,
    pub image_url: Option<String>,
    pub image_local_path: Option<String>,
    pub raw_json: String,
    pub created_at: Option<String>,
}
