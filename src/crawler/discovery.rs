//! Enumeration of the upstream catalogue
//!
//! The upstream API has no "list everything" endpoint for cocktails, so the
//! full ID set is assembled from one first-letter search per symbol of
//! [`SEARCH_ALPHABET`]. Enumeration is best-effort per symbol: a failed or
//! empty response contributes nothing and is not retried within the run.

use crate::config::SourceConfig;
use crate::crawler::fetcher::RateLimitedFetcher;
use crate::crawler::parser::{drink_ids, ingredient_names};
use std::collections::BTreeSet;

/// Symbols searched by first letter
pub const SEARCH_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Discovers every cocktail ID, deduplicated and sorted
pub async fn discover_cocktail_ids(
    fetcher: &RateLimitedFetcher,
    source: &SourceConfig,
) -> Vec<String> {
    let url = source.search_url();
    let mut all_ids = BTreeSet::new();

    for symbol in SEARCH_ALPHABET.chars() {
        tracing::info!("Searching cocktails starting with '{}'...", symbol);
        let symbol = symbol.to_string();

        let Some(response) = fetcher.fetch_json(&url, &[("f", symbol.as_str())]).await else {
            tracing::warn!("Search for '{}' failed, skipping", symbol);
            continue;
        };

        let ids = drink_ids(&response);
        if ids.is_empty() {
            tracing::warn!("No cocktails found for '{}'", symbol);
            continue;
        }

        tracing::info!("  Found {} cocktails", ids.len());
        all_ids.extend(ids);
    }

    tracing::info!("Total unique cocktails: {}", all_ids.len());
    all_ids.into_iter().collect()
}

/// Discovers every ingredient name, deduplicated and sorted
pub async fn discover_ingredient_names(
    fetcher: &RateLimitedFetcher,
    source: &SourceConfig,
) -> Vec<String> {
    let Some(response) = fetcher
        .fetch_json(&source.list_url(), &[("i", "list")])
        .await
    else {
        tracing::warn!("Ingredient listing failed");
        return Vec::new();
    };

    let names: BTreeSet<String> = ingredient_names(&response).into_iter().collect();
    tracing::info!("Found {} ingredients", names.len());
    names.into_iter().collect()
}
