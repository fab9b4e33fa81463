//! Output module for exporting and reporting the mirror
//!
//! This module handles:
//! - Exporting the store as denormalized JSON snapshots
//! - Recording mirror statistics
//! - Rendering cocktails for the terminal

mod display;
mod snapshot;
pub mod stats;

pub use display::format_cocktail;
pub use snapshot::{export_snapshot, SnapshotSummary};
pub use stats::{load_statistics, print_statistics, LedgerStatistics, MirrorStatistics};
