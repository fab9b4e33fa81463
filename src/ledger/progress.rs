use crate::ledger::WorkKind;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk ledger format
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

/// Errors that can occur while reading or writing the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error on ledger {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported ledger schema version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

fn legacy_schema_version() -> u32 {
    1
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Durable record of completed units of work
///
/// Four append-only sets plus timestamps, persisted as one JSON document.
/// Every mutation is written through immediately with an atomic
/// write-then-rename, so a crash loses at most the unit in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLedger {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    cocktails_downloaded: BTreeSet<String>,

    #[serde(default)]
    ingredients_downloaded: BTreeSet<String>,

    #[serde(default)]
    cocktail_images_downloaded: BTreeSet<String>,

    #[serde(default)]
    ingredient_images_downloaded: BTreeSet<String>,

    // Kept as text: older ledgers carry naive ISO timestamps without an offset.
    #[serde(default = "now_timestamp")]
    pub started_at: String,

    #[serde(default = "now_timestamp")]
    pub last_updated: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    #[serde(skip)]
    path: PathBuf,
}

impl ProgressLedger {
    /// Creates an empty ledger bound to `path` (nothing is written yet)
    pub fn new(path: &Path) -> Self {
        let now = now_timestamp();
        Self {
            schema_version: LEDGER_SCHEMA_VERSION,
            cocktails_downloaded: BTreeSet::new(),
            ingredients_downloaded: BTreeSet::new(),
            cocktail_images_downloaded: BTreeSet::new(),
            ingredient_images_downloaded: BTreeSet::new(),
            started_at: now.clone(),
            last_updated: now,
            config_hash: None,
            path: path.to_path_buf(),
        }
    }

    /// Loads the ledger from `path`, or starts an empty one
    ///
    /// A missing file yields an empty ledger. A file that cannot be parsed is
    /// logged and replaced by an empty ledger on the next save; the store is
    /// idempotent, so the only cost is redownloading. A ledger written by a
    /// newer format version is rejected.
    pub fn load(path: &Path) -> LedgerResult<Self> {
        if !path.exists() {
            tracing::debug!("No ledger at {}, starting empty", path.display());
            return Ok(Self::new(path));
        }

        let content = fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut ledger: ProgressLedger = match serde_json::from_str(&content) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse ledger {}: {}; starting empty",
                    path.display(),
                    e
                );
                return Ok(Self::new(path));
            }
        };

        if ledger.schema_version > LEDGER_SCHEMA_VERSION {
            return Err(LedgerError::UnsupportedVersion {
                found: ledger.schema_version,
                supported: LEDGER_SCHEMA_VERSION,
            });
        }

        ledger.schema_version = LEDGER_SCHEMA_VERSION;
        ledger.path = path.to_path_buf();
        Ok(ledger)
    }

    /// Path the ledger is persisted to
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set(&self, kind: WorkKind) -> &BTreeSet<String> {
        match kind {
            WorkKind::Cocktail => &self.cocktails_downloaded,
            WorkKind::Ingredient => &self.ingredients_downloaded,
            WorkKind::CocktailImage => &self.cocktail_images_downloaded,
            WorkKind::IngredientImage => &self.ingredient_images_downloaded,
        }
    }

    fn set_mut(&mut self, kind: WorkKind) -> &mut BTreeSet<String> {
        match kind {
            WorkKind::Cocktail => &mut self.cocktails_downloaded,
            WorkKind::Ingredient => &mut self.ingredients_downloaded,
            WorkKind::CocktailImage => &mut self.cocktail_images_downloaded,
            WorkKind::IngredientImage => &mut self.ingredient_images_downloaded,
        }
    }

    /// Checks whether a unit has been completed
    pub fn is_done(&self, kind: WorkKind, unit: &str) -> bool {
        self.set(kind).contains(unit)
    }

    /// Number of completed units of a kind
    pub fn count(&self, kind: WorkKind) -> usize {
        self.set(kind).len()
    }

    /// Returns the units of `universe` not yet completed, preserving order
    pub fn remaining(&self, kind: WorkKind, universe: &[String]) -> Vec<String> {
        let done = self.set(kind);
        universe
            .iter()
            .filter(|unit| !done.contains(unit.as_str()))
            .cloned()
            .collect()
    }

    /// Records a completed unit and persists the ledger immediately
    ///
    /// Returns `false` (and writes nothing) if the unit was already recorded.
    pub fn record(&mut self, kind: WorkKind, unit: &str) -> LedgerResult<bool> {
        if !self.set_mut(kind).insert(unit.to_string()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Binds the configuration hash, warning when it differs from the recorded one
    pub fn bind_config_hash(&mut self, hash: Option<&str>) {
        if let (Some(previous), Some(current)) = (self.config_hash.as_deref(), hash) {
            if previous != current {
                tracing::warn!(
                    "Configuration changed since this ledger was started (was {}, now {})",
                    previous,
                    current
                );
            }
        }
        if let Some(hash) = hash {
            self.config_hash = Some(hash.to_string());
        }
    }

    /// Stamps `last_updated` and atomically replaces the ledger file
    pub fn save(&mut self) -> LedgerResult<()> {
        self.last_updated = now_timestamp();
        let json = serde_json::to_vec_pretty(self)?;
        write_atomically(&self.path, &json).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Final checkpoint at the end of a run
    pub fn finalize(&mut self) -> LedgerResult<()> {
        self.save()?;
        tracing::debug!("Ledger finalized at {}", self.path.display());
        Ok(())
    }
}

/// Writes `bytes` to a sibling temp file, syncs it, then renames it over `path`
///
/// Readers of `path` see either the previous content or the new content,
/// never a partial write.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
