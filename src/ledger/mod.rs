//! Ledger module for tracking pipeline progress
//!
//! The ledger is the durable checkpoint that makes the pipeline resumable.
//!
//! # Components
//!
//! - `WorkKind`: The four categories of units of work (cocktails, ingredients, and their images)
//! - `ProgressLedger`: Append-only sets of completed units, written through on every change

mod progress;
mod work_kind;

// Re-export main types
pub use progress::{LedgerError, LedgerResult, ProgressLedger, LEDGER_SCHEMA_VERSION};
pub(crate) use progress::write_atomically;
pub use work_kind::WorkKind;
