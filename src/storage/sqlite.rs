//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CocktailRecord, IngredientLine, IngredientRecord};
use crate::MirrorError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const COCKTAIL_COLUMNS: &str = "id, name, category, alcoholic, glass, instructions, \
     instructions_ru, instructions_de, instructions_fr, instructions_es, instructions_it, \
     image_url, image_local_path, tags, video_url, iba, date_modified, raw_json, created_at";

const INGREDIENT_COLUMNS: &str = "id, name, source_id, description, type, alcohol, abv, \
     image_url, image_local_path, raw_json, created_at";

fn cocktail_from_row(row: &Row<'_>) -> rusqlite::Result<CocktailRecord> {
    Ok(CocktailRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        alcoholic: row.get(3)?,
        glass: row.get(4)?,
        instructions: row.get(5)?,
        instructions_ru: row.get(6)?,
        instructions_de: row.get(7)?,
        instructions_fr: row.get(8)?,
        instructions_es: row.get(9)?,
        instructions_it: row.get(10)?,
        image_url: row.get(11)?,
        image_local_path: row.get(12)?,
        tags: row.get(13)?,
        video_url: row.get(14)?,
        iba: row.get(15)?,
        date_modified: row.get(16)?,
        raw_json: row.get(17)?,
        created_at: row.get(18)?,
    })
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<IngredientRecord> {
    Ok(IngredientRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        source_id: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        alcohol: row.get(5)?,
        abv: row.get(6)?,
        image_url: row.get(7)?,
        image_local_path: row.get(8)?,
        raw_json: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Escapes `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Positions must start at 1 and strictly increase
fn check_positions(cocktail_id: &str, lines: &[IngredientLine]) -> StorageResult<()> {
    let mut previous = 0;
    for line in lines {
        if line.position <= previous {
            return Err(StorageError::InvalidPosition {
                cocktail_id: cocktail_id.to_string(),
                position: line.position,
            });
        }
        previous = line.position;
    }
    Ok(())
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(MirrorError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, MirrorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_cocktails<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> StorageResult<Vec<CocktailRecord>> {
        let sql = format!("SELECT {} FROM cocktails {}", COCKTAIL_COLUMNS, where_clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let cocktails = stmt
            .query_map(params, cocktail_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cocktails)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Cocktails =====

    fn upsert_cocktail(
        &mut self,
        cocktail: &CocktailRecord,
        lines: &[IngredientLine],
    ) -> StorageResult<()> {
        check_positions(&cocktail.id, lines)?;

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO cocktails (id, name, category, alcoholic, glass, instructions,
                 instructions_ru, instructions_de, instructions_fr, instructions_es,
                 instructions_it, image_url, image_local_path, tags, video_url, iba,
                 date_modified, raw_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 alcoholic = excluded.alcoholic,
                 glass = excluded.glass,
                 instructions = excluded.instructions,
                 instructions_ru = excluded.instructions_ru,
                 instructions_de = excluded.instructions_de,
                 instructions_fr = excluded.instructions_fr,
                 instructions_es = excluded.instructions_es,
                 instructions_it = excluded.instructions_it,
                 image_url = excluded.image_url,
                 image_local_path = COALESCE(excluded.image_local_path, cocktails.image_local_path),
                 tags = excluded.tags,
                 video_url = excluded.video_url,
                 iba = excluded.iba,
                 date_modified = excluded.date_modified,
                 raw_json = excluded.raw_json",
            params![
                cocktail.id,
                cocktail.name,
                cocktail.category,
                cocktail.alcoholic,
                cocktail.glass,
                cocktail.instructions,
                cocktail.instructions_ru,
                cocktail.instructions_de,
                cocktail.instructions_fr,
                cocktail.instructions_es,
                cocktail.instructions_it,
                cocktail.image_url,
                cocktail.image_local_path,
                cocktail.tags,
                cocktail.video_url,
                cocktail.iba,
                cocktail.date_modified,
                cocktail.raw_json,
            ],
        )?;

        tx.execute(
            "DELETE FROM cocktail_ingredients WHERE cocktail_id = ?1",
            params![cocktail.id],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO cocktail_ingredients (cocktail_id, ingredient, measure, position)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for line in lines {
                insert.execute(params![
                    cocktail.id,
                    line.ingredient,
                    line.measure,
                    line.position
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_cocktail(&self, id: &str) -> StorageResult<Option<CocktailRecord>> {
        let sql = format!("SELECT {} FROM cocktails WHERE id = ?1", COCKTAIL_COLUMNS);
        let cocktail = self
            .conn
            .query_row(&sql, params![id], cocktail_from_row)
            .optional()?;
        Ok(cocktail)
    }

    fn get_cocktail_image_url(&self, id: &str) -> StorageResult<Option<String>> {
        let url: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT image_url FROM cocktails WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(url.flatten().filter(|u| !u.trim().is_empty()))
    }

    fn set_cocktail_image_path(&mut self, id: &str, path: &str) -> StorageResult<bool> {
        let updated = self.conn.execute(
            "UPDATE cocktails SET image_local_path = ?1 WHERE id = ?2",
            params![path, id],
        )?;
        Ok(updated > 0)
    }

    fn get_ingredient_lines(&self, cocktail_id: &str) -> StorageResult<Vec<IngredientLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT position, ingredient, measure FROM cocktail_ingredients
             WHERE cocktail_id = ?1 ORDER BY position",
        )?;

        let lines = stmt
            .query_map(params![cocktail_id], |row| {
                Ok(IngredientLine {
                    position: row.get(0)?,
                    ingredient: row.get(1)?,
                    measure: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    fn list_cocktails(&self) -> StorageResult<Vec<CocktailRecord>> {
        self.query_cocktails("ORDER BY id", [])
    }

    // ===== Ingredients =====

    fn upsert_ingredient(&mut self, ingredient: &IngredientRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO ingredients (id, name, source_id, description, type, alcohol, abv,
                 image_url, image_local_path, raw_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 source_id = excluded.source_id,
                 description = excluded.description,
                 type = excluded.type,
                 alcohol = excluded.alcohol,
                 abv = excluded.abv,
                 image_url = excluded.image_url,
                 image_local_path = COALESCE(excluded.image_local_path, ingredients.image_local_path),
                 raw_json = excluded.raw_json",
            params![
                ingredient.id,
                ingredient.name,
                ingredient.source_id,
                ingredient.description,
                ingredient.kind,
                ingredient.alcohol,
                ingredient.abv,
                ingredient.image_url,
                ingredient.image_local_path,
                ingredient.raw_json,
            ],
        )?;
        Ok(())
    }

    fn get_ingredient(&self, name: &str) -> StorageResult<Option<IngredientRecord>> {
        let sql = format!(
            "SELECT {} FROM ingredients WHERE id = ?1",
            INGREDIENT_COLUMNS
        );
        let ingredient = self
            .conn
            .query_row(&sql, params![name], ingredient_from_row)
            .optional()?;
        Ok(ingredient)
    }

    fn set_ingredient_image_path(&mut self, name: &str, path: &str) -> StorageResult<bool> {
        let updated = self.conn.execute(
            "UPDATE ingredients SET image_local_path = ?1 WHERE id = ?2",
            params![path, name],
        )?;
        Ok(updated > 0)
    }

    fn list_ingredients(&self) -> StorageResult<Vec<IngredientRecord>> {
        let sql = format!("SELECT {} FROM ingredients ORDER BY id", INGREDIENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let ingredients = stmt
            .query_map([], ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    // ===== Lookups =====

    fn search_cocktails_by_name(
        &self,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<CocktailRecord>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        self.query_cocktails(
            "WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name LIMIT ?2",
            params![pattern, limit as i64],
        )
    }

    fn find_cocktails_by_ingredient(
        &self,
        ingredient: &str,
        limit: usize,
    ) -> StorageResult<Vec<CocktailRecord>> {
        self.query_cocktails(
            "WHERE id IN (SELECT cocktail_id FROM cocktail_ingredients
                          WHERE ingredient = ?1 COLLATE NOCASE)
             ORDER BY name LIMIT ?2",
            params![ingredient.trim(), limit as i64],
        )
    }

    fn random_cocktail(&self) -> StorageResult<Option<CocktailRecord>> {
        let sql = format!(
            "SELECT {} FROM cocktails ORDER BY RANDOM() LIMIT 1",
            COCKTAIL_COLUMNS
        );
        let cocktail = self
            .conn
            .query_row(&sql, [], cocktail_from_row)
            .optional()?;
        Ok(cocktail)
    }

    // ===== Statistics =====

    fn count_cocktails(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM cocktails")
    }

    fn count_ingredient_lines(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM cocktail_ingredients")
    }

    fn count_ingredients(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM ingredients")
    }

    fn count_cocktail_images(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM cocktails WHERE image_local_path IS NOT NULL")
    }

    fn count_ingredient_images(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM ingredients WHERE image_local_path IS NOT NULL")
    }
}
