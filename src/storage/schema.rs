//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Cocktail-Mirror database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Cocktails, one row per external ID
CREATE TABLE IF NOT EXISTS cocktails (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    alcoholic TEXT,
    glass TEXT,
    instructions TEXT,
    instructions_ru TEXT,
    instructions_de TEXT,
    instructions_fr TEXT,
    instructions_es TEXT,
    instructions_it TEXT,
    image_url TEXT,
    image_local_path TEXT,
    tags TEXT,
    video_url TEXT,
    iba TEXT,
    date_modified TEXT,
    raw_json TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_cocktails_name ON cocktails(name);
CREATE INDEX IF NOT EXISTS idx_cocktails_category ON cocktails(category);

-- Ingredient lines of a cocktail, ordered by source position
CREATE TABLE IF NOT EXISTS cocktail_ingredients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cocktail_id TEXT NOT NULL REFERENCES cocktails(id) ON DELETE CASCADE,
    ingredient TEXT NOT NULL,
    measure TEXT,
    position INTEGER NOT NULL,
    UNIQUE(cocktail_id, position)
);

CREATE INDEX IF NOT EXISTS idx_ingredients_cocktail ON cocktail_ingredients(cocktail_id);
CREATE INDEX IF NOT EXISTS idx_cocktail_ingredients_ingredient ON cocktail_ingredients(ingredient);

-- Ingredients, one row per ingredient name
CREATE TABLE IF NOT EXISTS ingredients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    source_id TEXT,
    description TEXT,
    type TEXT,
    alcohol TEXT,
    abv TEXT,
    image_url TEXT,
    image_local_path TEXT,
    raw_json TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
///
/// Stored in `PRAGMA user_version` for future migrations.
pub fn get_schema_version() -> u32 {
    1
}
