//! Statistics generation from the mirror database
//!
//! This module provides functionality for extracting and displaying
//! mirror statistics from the storage layer and the progress ledger.

use crate::ledger::{ProgressLedger, WorkKind};
use crate::storage::Storage;
use crate::MirrorError;

/// Ledger view included in the statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStatistics {
    /// Completed units per work kind, in pipeline order
    pub completed: Vec<(WorkKind, usize)>,
    pub started_at: String,
    pub last_updated: String,
}

/// Mirror statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStatistics {
    /// Total number of cocktail rows
    pub cocktails: u64,

    /// Total number of cocktail ingredient lines
    pub ingredient_lines: u64,

    /// Total number of ingredient rows
    pub ingredients: u64,

    /// Cocktails with a local image
    pub cocktail_images: u64,

    /// Ingredients with a local image
    pub ingredient_images: u64,

    /// Ledger progress, when a ledger was available
    pub ledger: Option<LedgerStatistics>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `ledger` - The progress ledger, if one exists
///
/// # Returns
///
/// * `Ok(MirrorStatistics)` - Successfully loaded statistics
/// * `Err(MirrorError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    ledger: Option<&ProgressLedger>,
) -> Result<MirrorStatistics, MirrorError> {
    let ledger = ledger.map(|ledger| LedgerStatistics {
        completed: WorkKind::ALL
            .iter()
            .map(|&kind| (kind, ledger.count(kind)))
            .collect(),
        started_at: ledger.started_at.clone(),
        last_updated: ledger.last_updated.clone(),
    });

    Ok(MirrorStatistics {
        cocktails: storage.count_cocktails()?,
        ingredient_lines: storage.count_ingredient_lines()?,
        ingredients: storage.count_ingredients()?,
        cocktail_images: storage.count_cocktail_images()?,
        ingredient_images: storage.count_ingredient_images()?,
        ledger,
    })
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &MirrorStatistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Store:");
    println!("  Cocktails: {}", stats.cocktails);
    println!("  Ingredient lines: {}", stats.ingredient_lines);
    if stats.cocktails > 0 {
        println!(
            "  Average ingredients per cocktail: {:.1}",
            stats.ingredient_lines as f64 / stats.cocktails as f64
        );
    }
    println!("  Ingredients: {}", stats.ingredients);
    println!();

    println!("Images:");
    println!(
        "  Cocktail images: {} ({:.1}%)",
        stats.cocktail_images,
        percentage(stats.cocktail_images, stats.cocktails)
    );
    println!(
        "  Ingredient images: {} ({:.1}%)",
        stats.ingredient_images,
        percentage(stats.ingredient_images, stats.ingredients)
    );
    println!();

    match &stats.ledger {
        Some(ledger) => {
            println!("Progress Ledger:");
            for (kind, count) in &ledger.completed {
                println!("  {}: {}", kind, count);
            }
            println!("  Started: {}", ledger.started_at);
            println!("  Last updated: {}", ledger.last_updated);
        }
        None => println!("No progress ledger found"),
    }
}
