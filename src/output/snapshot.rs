//! JSON snapshot export
//!
//! Flattens the relational store into two documents: an array of cocktails,
//! each with its ingredient lines embedded in position order, and an array of
//! ingredients. The export only reads the store.

use crate::ledger::write_atomically;
use crate::storage::{CocktailRecord, IngredientLine, Storage};
use crate::MirrorError;
use serde::Serialize;
use std::path::Path;

/// Counts of exported documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub cocktails: usize,
    pub ingredients: usize,
}

#[derive(Debug, Serialize)]
struct SnapshotLine<'a> {
    ingredient: &'a str,
    measure: &'a str,
}

impl<'a> From<&'a IngredientLine> for SnapshotLine<'a> {
    fn from(line: &'a IngredientLine) -> Self {
        Self {
            ingredient: &line.ingredient,
            measure: line.measure.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Serialize)]
struct SnapshotCocktail<'a> {
    #[serde(flatten)]
    cocktail: &'a CocktailRecord,
    ingredients: Vec<SnapshotLine<'a>>,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), MirrorError> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomically(path, &json)?;
    Ok(())
}

/// Writes the cocktail and ingredient snapshots
///
/// # Arguments
///
/// * `storage` - The store to read from
/// * `cocktails_path` - Destination of the cocktails array
/// * `ingredients_path` - Destination of the ingredients array
///
/// # Returns
///
/// * `Ok(SnapshotSummary)` - Number of documents written per file
/// * `Err(MirrorError)` - Failed to read the store or write a file
pub fn export_snapshot(
    storage: &dyn Storage,
    cocktails_path: &Path,
    ingredients_path: &Path,
) -> Result<SnapshotSummary, MirrorError> {
    tracing::info!("Exporting snapshot...");

    let cocktails = storage.list_cocktails()?;
    let mut lines = Vec::with_capacity(cocktails.len());
    for cocktail in &cocktails {
        lines.push(storage.get_ingredient_lines(&cocktail.id)?);
    }

    let documents: Vec<SnapshotCocktail<'_>> = cocktails
        .iter()
        .zip(&lines)
        .map(|(cocktail, lines)| SnapshotCocktail {
            cocktail,
            ingredients: lines.iter().map(SnapshotLine::from).collect(),
        })
        .collect();
    write_json(cocktails_path, &documents)?;
    tracing::info!(
        "Exported {} cocktails to {}",
        documents.len(),
        cocktails_path.display()
    );

    let ingredients = storage.list_ingredients()?;
    write_json(ingredients_path, &ingredients)?;
    tracing::info!(
        "Exported {} ingredients to {}",
        ingredients.len(),
        ingredients_path.display()
    );

    Ok(SnapshotSummary {
        cocktails: documents.len(),
        ingredients: ingredients.len(),
    })
}
