//! Crawler module for mirroring the upstream catalogue
//!
//! This module contains the core mirroring logic, including:
//! - Rate-limited HTTP fetching of JSON documents and images
//! - Enumeration of cocktail IDs and ingredient names
//! - Payload parsing into store records
//! - Overall pipeline coordination

mod coordinator;
mod discovery;
mod fetcher;
mod parser;

pub use coordinator::{run_pipeline, sanitize_file_name, Coordinator, RunSummary, Stage, StageReport};
pub use discovery::{discover_cocktail_ids, discover_ingredient_names, SEARCH_ALPHABET};
pub use fetcher::{build_http_client, RateLimitedFetcher};
pub use parser::{
    drink_ids, extract_ingredient_lines, first_drink, first_ingredient, ingredient_names,
    parse_drink, parse_ingredient, ParseError, ParsedCocktail, MAX_INGREDIENT_SLOTS,
};
