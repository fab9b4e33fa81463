//! Text rendering of cocktails for terminal output

use crate::storage::{CocktailRecord, IngredientLine};

/// Renders a cocktail as a text card
///
/// Lines are listed in the order given; callers pass them as returned by the
/// store (position order).
pub fn format_cocktail(cocktail: &CocktailRecord, lines: &[IngredientLine]) -> String {
    let mut card = String::new();

    card.push_str(&format!("{}\n", cocktail.name));
    card.push_str(&format!("{}\n", "=".repeat(cocktail.name.chars().count())));

    let details = [
        ("Category", &cocktail.category),
        ("Type", &cocktail.alcoholic),
        ("Glass", &cocktail.glass),
    ];
    for (label, value) in details {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            card.push_str(&format!("{}: {}\n", label, value));
        }
    }

    if !lines.is_empty() {
        card.push_str("\nIngredients:\n");
        for line in lines {
            match line.measure.as_deref() {
                Some(measure) => {
                    card.push_str(&format!("  - {} {}\n", measure, line.ingredient))
                }
                None => card.push_str(&format!("  - {}\n", line.ingredient)),
            }
        }
    }

    if let Some(instructions) = cocktail
        .instructions
        .as_deref()
        .filter(|v| !v.trim().is_empty())
    {
        card.push_str(&format!("\nInstructions:\n{}\n", instructions.trim()));
    }

    card
}
