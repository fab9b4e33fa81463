//! Kinds of work units tracked by the progress ledger
//!
//! Each kind has its own append-only set in the ledger, so every pipeline
//! stage can compute its backlog independently of the others.

use std::fmt;

/// A category of unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkKind {
    /// A cocktail record, keyed by external ID
    Cocktail,

    /// An ingredient record, keyed by ingredient name
    Ingredient,

    /// A cocktail thumbnail download, keyed by external ID
    CocktailImage,

    /// An ingredient image download, keyed by ingredient name
    IngredientImage,
}

impl WorkKind {
    /// All kinds, in pipeline order
    pub const ALL: [WorkKind; 4] = [
        Self::Cocktail,
        Self::Ingredient,
        Self::CocktailImage,
        Self::IngredientImage,
    ];

    /// Name of the ledger list holding this kind
    pub fn ledger_key(&self) -> &'static str {
        match self {
            Self::Cocktail => "cocktails_downloaded",
            Self::Ingredient => "ingredients_downloaded",
            Self::CocktailImage => "cocktail_images_downloaded",
            Self::IngredientImage => "ingredient_images_downloaded",
        }
    }

    /// Human-readable label for log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cocktail => "cocktails",
            Self::Ingredient => "ingredients",
            Self::CocktailImage => "cocktail images",
            Self::IngredientImage => "ingredient images",
        }
    }

    /// How often a stage over this kind logs progress
    pub fn progress_interval(&self) -> usize {
        match self {
            Self::Cocktail | Self::Ingredient => 10,
            Self::CocktailImage | Self::IngredientImage => 20,
        }
    }
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
