//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CocktailRecord, IngredientLine, IngredientRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid ingredient position {position} for cocktail {cocktail_id}")]
    InvalidPosition { cocktail_id: String, position: u32 },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The store is the single writer of all relational data. Upserts replace the
/// row for a key wholesale; ingredient lines are replaced as a group.
pub trait Storage {
    // ===== Cocktails =====

    /// Inserts or replaces a cocktail and all of its ingredient lines
    ///
    /// Runs as one transaction: the row is upserted by ID, every existing line
    /// for the cocktail is deleted, and `lines` are inserted in order. A
    /// previously recorded `image_local_path` is kept.
    fn upsert_cocktail(
        &mut self,
        cocktail: &CocktailRecord,
        lines: &[IngredientLine],
    ) -> StorageResult<()>;

    /// Gets a cocktail by external ID
    fn get_cocktail(&self, id: &str) -> StorageResult<Option<CocktailRecord>>;

    /// Gets the stored thumbnail URL of a cocktail (None if absent or blank)
    fn get_cocktail_image_url(&self, id: &str) -> StorageResult<Option<String>>;

    /// Records the local image path; returns false if no such cocktail exists
    fn set_cocktail_image_path(&mut self, id: &str, path: &str) -> StorageResult<bool>;

    /// Gets a cocktail's ingredient lines ordered by position
    fn get_ingredient_lines(&self, cocktail_id: &str) -> StorageResult<Vec<IngredientLine>>;

    /// Lists all cocktails ordered by ID
    fn list_cocktails(&self) -> StorageResult<Vec<CocktailRecord>>;

    // ===== Ingredients =====

    /// Inserts or replaces an ingredient keyed by name
    fn upsert_ingredient(&mut self, ingredient: &IngredientRecord) -> StorageResult<()>;

    /// Gets an ingredient by name
    fn get_ingredient(&self, name: &str) -> StorageResult<Option<IngredientRecord>>;

    /// Records the local image path; returns false if no such ingredient exists
    fn set_ingredient_image_path(&mut self, name: &str, path: &str) -> StorageResult<bool>;

    /// Lists all ingredients ordered by name
    fn list_ingredients(&self) -> StorageResult<Vec<IngredientRecord>>;

    // ===== Lookups =====

    /// Case-insensitive substring search on cocktail names
    fn search_cocktails_by_name(
        &self,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<CocktailRecord>>;

    /// Cocktails having an ingredient line with this name (case-insensitive)
    fn find_cocktails_by_ingredient(
        &self,
        ingredient: &str,
        limit: usize,
    ) -> StorageResult<Vec<CocktailRecord>>;

    /// Picks one cocktail at random
    fn random_cocktail(&self) -> StorageResult<Option<CocktailRecord>>;

    // ===== Statistics =====

    fn count_cocktails(&self) -> StorageResult<u64>;

    fn count_ingredient_lines(&self) -> StorageResult<u64>;

    fn count_ingredients(&self) -> StorageResult<u64>;

    /// Cocktails with a recorded local image
    fn count_cocktail_images(&self) -> StorageResult<u64>;

    /// Ingredients with a recorded local image
    fn count_ingredient_images(&self) -> StorageResult<u64>;
}
