//! Upstream payload parsing
//!
//! This module turns the upstream API's JSON documents into store records:
//! - Extracting IDs and names from search and listing responses
//! - Mapping `drinks[]` entries to cocktail rows plus ingredient lines
//! - Mapping `ingredients[]` entries to ingredient rows
//!
//! The upstream spreads a cocktail's ingredients over positional fields
//! (`strIngredient1..15`, `strMeasure1..15`); a slot is absent once its
//! ingredient is null or blank.

use crate::storage::{CocktailRecord, IngredientLine, IngredientRecord};
use serde_json::Value;
use thiserror::Error;

/// Number of positional ingredient slots in a drink payload
pub const MAX_INGREDIENT_SLOTS: u32 = 15;

/// Data-shape failures in a successfully fetched payload
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected a JSON object")]
    NotAnObject,

    #[error("Missing or blank field: {0}")]
    MissingField(&'static str),
}

/// A drink payload split into its row and its ingredient lines
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCocktail {
    pub record: CocktailRecord,
    pub lines: Vec<IngredientLine>,
}

/// Reads a field as text; numbers are accepted and rendered as text
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a field as trimmed, non-blank text
fn trimmed_field(value: &Value, key: &str) -> Option<String> {
    text_field(value, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_field(value: &Value, key: &'static str) -> Result<String, ParseError> {
    trimmed_field(value, key).ok_or(ParseError::MissingField(key))
}

fn array<'a>(response: &'a Value, key: &str) -> &'a [Value] {
    response
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// First entry of the `drinks` array, if any
pub fn first_drink(response: &Value) -> Option<&Value> {
    array(response, "drinks").first()
}

/// First entry of the `ingredients` array, if any
pub fn first_ingredient(response: &Value) -> Option<&Value> {
    array(response, "ingredients").first()
}

/// IDs of every drink in a search response (`drinks: null` yields none)
pub fn drink_ids(response: &Value) -> Vec<String> {
    array(response, "drinks")
        .iter()
        .filter_map(|drink| trimmed_field(drink, "idDrink"))
        .collect()
}

/// Ingredient names of an ingredient listing response
///
/// The listing reuses the `drinks` array with one `strIngredient1` per entry.
pub fn ingredient_names(response: &Value) -> Vec<String> {
    array(response, "drinks")
        .iter()
        .filter_map(|entry| trimmed_field(entry, "strIngredient1"))
        .collect()
}

/// Scans ingredient slots 1..=15 in slot order
///
/// Blank or null ingredients are skipped, keeping the original slot number as
/// the line's position. Measures are trimmed; a blank measure is absent.
pub fn extract_ingredient_lines(drink: &Value) -> Vec<IngredientLine> {
    (1..=MAX_INGREDIENT_SLOTS)
        .filter_map(|position| {
            let ingredient = trimmed_field(drink, &format!("strIngredient{}", position))?;
            Some(IngredientLine {
                position,
                ingredient,
                measure: trimmed_field(drink, &format!("strMeasure{}", position)),
            })
        })
        .collect()
}

/// Maps a drink payload to a cocktail row and its ingredient lines
///
/// `idDrink` and `strDrink` are required. The payload is kept verbatim in
/// `raw_json`.
pub fn parse_drink(drink: &Value) -> Result<ParsedCocktail, ParseError> {
    if !drink.is_object() {
        return Err(ParseError::NotAnObject);
    }

    let record = CocktailRecord {
        id: required_field(drink, "idDrink")?,
        name: required_field(drink, "strDrink")?,
        category: text_field(drink, "strCategory"),
        alcoholic: text_field(drink, "strAlcoholic"),
        glass: text_field(drink, "strGlass"),
        instructions: text_field(drink, "strInstructions"),
        instructions_ru: text_field(drink, "strInstructionsRU"),
        instructions_de: text_field(drink, "strInstructionsDE"),
        instructions_fr: text_field(drink, "strInstructionsFR"),
        instructions_es: text_field(drink, "strInstructionsES"),
        instructions_it: text_field(drink, "strInstructionsIT"),
        image_url: text_field(drink, "strDrinkThumb"),
        image_local_path: None,
        tags: text_field(drink, "strTags"),
        video_url: text_field(drink, "strVideo"),
        iba: text_field(drink, "strIBA"),
        date_modified: text_field(drink, "dateModified"),
        raw_json: drink.to_string(),
        created_at: None,
    };

    Ok(ParsedCocktail {
        record,
        lines: extract_ingredient_lines(drink),
    })
}

/// Maps an ingredient payload to an ingredient row
///
/// The row is keyed by `lookup_name`, the name the ingredient was enumerated
/// under, rather than by the upstream numeric id.
pub fn parse_ingredient(
    ingredient: &Value,
    lookup_name: &str,
    image_url: Option<String>,
) -> Result<IngredientRecord, ParseError> {
    if !ingredient.is_object() {
        return Err(ParseError::NotAnObject);
    }

    Ok(IngredientRecord {
        id: lookup_name.to_string(),
        name: required_field(ingredient, "strIngredient")?,
        source_id: trimmed_field(ingredient, "idIngredient"),
        description: text_field(ingredient, "strDescription"),
        kind: text_field(ingredient, "strType"),
        alcohol: text_field(ingredient, "strAlcohol"),
        abv: text_field(ingredient, "strABV"),
        image_url,
        image_local_path: None,
        raw_json: ingredient.to_string(),
        created_at: None,
    })
}
