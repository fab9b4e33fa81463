//! Pipeline coordinator - main mirror orchestration logic
//!
//! This module sequences the five pipeline stages:
//! 1. Discover the cocktail ID and ingredient name universe
//! 2. Download cocktail records
//! 3. Download ingredient records
//! 4. Download cocktail images
//! 5. Download ingredient images
//!
//! Each stage drains its whole backlog ("discovered minus ledger") before the
//! next one starts. Every completed unit is written to the store first and to
//! the ledger second, so an interruption at any point costs at most one
//! redownload of an idempotent upsert.

use crate::config::Config;
use crate::crawler::discovery::{discover_cocktail_ids, discover_ingredient_names};
use crate::crawler::fetcher::RateLimitedFetcher;
use crate::crawler::parser::{first_drink, first_ingredient, parse_drink, parse_ingredient};
use crate::ledger::{ProgressLedger, WorkKind};
use crate::output::{export_snapshot, SnapshotSummary};
use crate::storage::{SqliteStorage, Storage};
use crate::MirrorError;
use std::fmt;
use std::path::Path;

/// Replaces characters that cannot appear in an image file name
pub fn sanitize_file_name(name: &str) -> String {
    name.replace('/', "-").replace(' ', "_")
}

/// Stages of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Cocktails,
    Ingredients,
    CocktailImages,
    IngredientImages,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Self::Discover,
        Self::Cocktails,
        Self::Ingredients,
        Self::CocktailImages,
        Self::IngredientImages,
    ];

    /// 1-based position in the pipeline
    pub fn number(&self) -> usize {
        match self {
            Self::Discover => 1,
            Self::Cocktails => 2,
            Self::Ingredients => 3,
            Self::CocktailImages => 4,
            Self::IngredientImages => 5,
        }
    }

    /// Ledger set the stage checkpoints into (discovery is not checkpointed)
    pub fn work_kind(&self) -> Option<WorkKind> {
        match self {
            Self::Discover => None,
            Self::Cocktails => Some(WorkKind::Cocktail),
            Self::Ingredients => Some(WorkKind::Ingredient),
            Self::CocktailImages => Some(WorkKind::CocktailImage),
            Self::IngredientImages => Some(WorkKind::IngredientImage),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Discover => "Discovering cocktails and ingredients",
            Self::Cocktails => "Downloading cocktails",
            Self::Ingredients => "Downloading ingredients",
            Self::CocktailImages => "Downloading cocktail images",
            Self::IngredientImages => "Downloading ingredient images",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.number(), Self::ALL.len(), self.title())
    }
}

/// Outcome of one download stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Units not yet in the ledger when the stage started
    pub pending: usize,
    /// Units completed during this stage
    pub completed: usize,
    /// Units that did not complete; they are retried by the next run
    pub failed: usize,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cocktail_ids: usize,
    pub ingredient_names: usize,
    pub cocktails: StageReport,
    pub ingredients: StageReport,
    pub cocktail_images: StageReport,
    pub ingredient_images: StageReport,
    pub snapshot: SnapshotSummary,
}

/// Main pipeline coordinator structure
///
/// Owns the ledger's lifecycle (load, record, finalize) and is the only
/// writer to the store during a run.
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    fetcher: RateLimitedFetcher,
    ledger: ProgressLedger,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Creates the data and image directories, opens the store and loads the
    /// ledger.
    ///
    /// # Arguments
    ///
    /// * `config` - The mirror configuration
    /// * `fresh` - Start with an empty ledger instead of resuming
    pub fn new(config: Config, fresh: bool) -> Result<Self, MirrorError> {
        let output = &config.output;
        std::fs::create_dir_all(&output.data_dir)?;
        std::fs::create_dir_all(output.cocktail_images_dir())?;
        std::fs::create_dir_all(output.ingredient_images_dir())?;

        let storage = SqliteStorage::new(&output.database_path())?;

        let ledger = if fresh {
            tracing::info!("Starting with an empty ledger");
            let mut ledger = ProgressLedger::new(&output.progress_path());
            ledger.save()?;
            ledger
        } else {
            ProgressLedger::load(&output.progress_path())?
        };

        tracing::info!("Progress ledger: {}", ledger.path().display());
        tracing::info!(
            "Progress: {} cocktails, {} ingredients, {} cocktail images, {} ingredient images",
            ledger.count(WorkKind::Cocktail),
            ledger.count(WorkKind::Ingredient),
            ledger.count(WorkKind::CocktailImage),
            ledger.count(WorkKind::IngredientImage)
        );

        let fetcher = RateLimitedFetcher::new(&config)?;

        Ok(Self {
            config,
            storage,
            fetcher,
            ledger,
        })
    }

    /// Records the configuration hash in the ledger
    pub fn bind_config_hash(&mut self, hash: Option<&str>) {
        self.ledger.bind_config_hash(hash);
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    /// Runs the five stages, finalizes the ledger and exports the snapshot
    pub async fn run(&mut self) -> Result<RunSummary, MirrorError> {
        tracing::info!("Starting mirror run");
        let start_time = std::time::Instant::now();

        tracing::info!("{}", Stage::Discover);
        let (cocktail_ids, ingredient_names) = self.discover().await;

        let mut summary = RunSummary {
            cocktail_ids: cocktail_ids.len(),
            ingredient_names: ingredient_names.len(),
            ..RunSummary::default()
        };

        summary.cocktails = self.run_stage(Stage::Cocktails, &cocktail_ids).await?;
        summary.ingredients = self
            .run_stage(Stage::Ingredients, &ingredient_names)
            .await?;
        summary.cocktail_images = self
            .run_stage(Stage::CocktailImages, &cocktail_ids)
            .await?;
        summary.ingredient_images = self
            .run_stage(Stage::IngredientImages, &ingredient_names)
            .await?;

        self.ledger.finalize()?;

        tracing::info!("Mirror run finished in {:?}", start_time.elapsed());
        for kind in WorkKind::ALL {
            tracing::info!("  {}: {}", kind, self.ledger.count(kind));
        }

        summary.snapshot = self.export()?;
        Ok(summary)
    }

    /// Computes the cocktail ID and ingredient name universe
    pub async fn discover(&self) -> (Vec<String>, Vec<String>) {
        let source = &self.config.source;
        let cocktail_ids = discover_cocktail_ids(&self.fetcher, source).await;
        let ingredient_names = discover_ingredient_names(&self.fetcher, source).await;
        (cocktail_ids, ingredient_names)
    }

    /// Writes the JSON snapshot of the current store
    pub fn export(&self) -> Result<SnapshotSummary, MirrorError> {
        export_snapshot(
            &self.storage,
            &self.config.output.cocktails_export_path(),
            &self.config.output.ingredients_export_path(),
        )
    }

    /// Drains the backlog of one download stage
    pub async fn run_stage(
        &mut self,
        stage: Stage,
        universe: &[String],
    ) -> Result<StageReport, MirrorError> {
        let Some(kind) = stage.work_kind() else {
            return Ok(StageReport::default());
        };

        tracing::info!("{}", stage);
        let remaining = self.ledger.remaining(kind, universe);
        tracing::info!("Remaining: {} of {} {}", remaining.len(), universe.len(), kind);

        let mut report = StageReport {
            pending: remaining.len(),
            ..StageReport::default()
        };
        let interval = kind.progress_interval();

        for (i, unit) in remaining.iter().enumerate() {
            let done = match kind {
                WorkKind::Cocktail => self.download_cocktail(unit).await?,
                WorkKind::Ingredient => self.download_ingredient(unit).await?,
                WorkKind::CocktailImage => self.download_cocktail_image(unit).await?,
                WorkKind::IngredientImage => self.download_ingredient_image(unit).await?,
            };

            if done {
                report.completed += 1;
            } else {
                report.failed += 1;
            }

            if (i + 1) % interval == 0 {
                tracing::info!("Progress: {}/{} {}", i + 1, remaining.len(), kind);
            }
        }

        if report.failed > 0 {
            tracing::warn!(
                "{} {} did not complete and will be retried on the next run",
                report.failed,
                kind
            );
        }

        Ok(report)
    }

    /// Downloads one cocktail record
    ///
    /// Returns `Ok(false)` when the unit did not complete (fetch or data-shape
    /// failure); store and ledger failures are errors.
    pub async fn download_cocktail(&mut self, cocktail_id: &str) -> Result<bool, MirrorError> {
        if self.ledger.is_done(WorkKind::Cocktail, cocktail_id) {
            return Ok(true);
        }

        let Some(response) = self
            .fetcher
            .fetch_json(&self.config.source.lookup_url(), &[("i", cocktail_id)])
            .await
        else {
            return Ok(false);
        };

        let Some(drink) = first_drink(&response) else {
            tracing::warn!("Cocktail {} not found", cocktail_id);
            return Ok(false);
        };

        let parsed = match parse_drink(drink) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping cocktail {}: {}", cocktail_id, e);
                return Ok(false);
            }
        };

        if parsed.record.id != cocktail_id {
            tracing::warn!(
                "Lookup for cocktail {} returned cocktail {}, skipping",
                cocktail_id,
                parsed.record.id
            );
            return Ok(false);
        }

        self.storage.upsert_cocktail(&parsed.record, &parsed.lines)?;
        self.ledger.record(WorkKind::Cocktail, cocktail_id)?;

        tracing::info!(
            "Downloaded cocktail: {} ({})",
            parsed.record.name,
            cocktail_id
        );
        Ok(true)
    }

    /// Downloads one ingredient record, keyed by its name
    pub async fn download_ingredient(&mut self, name: &str) -> Result<bool, MirrorError> {
        if self.ledger.is_done(WorkKind::Ingredient, name) {
            return Ok(true);
        }

        let source = &self.config.source;
        let Some(response) = self
            .fetcher
            .fetch_json(&source.search_url(), &[("i", name)])
            .await
        else {
            return Ok(false);
        };

        let Some(payload) = first_ingredient(&response) else {
            tracing::warn!("Ingredient '{}' not found", name);
            return Ok(false);
        };

        let image_url = match source.ingredient_image_url(name) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!("No image URL for ingredient '{}': {}", name, e);
                None
            }
        };

        let record = match parse_ingredient(payload, name, image_url) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping ingredient '{}': {}", name, e);
                return Ok(false);
            }
        };

        self.storage.upsert_ingredient(&record)?;
        self.ledger.record(WorkKind::Ingredient, name)?;

        tracing::info!("Downloaded ingredient: {}", name);
        Ok(true)
    }

    /// Downloads the thumbnail of a stored cocktail
    ///
    /// Needs the cocktail row (stage 2); without a stored thumbnail URL there
    /// is nothing to download and the unit stays pending.
    pub async fn download_cocktail_image(&mut self, cocktail_id: &str) -> Result<bool, MirrorError> {
        if self.ledger.is_done(WorkKind::CocktailImage, cocktail_id) {
            return Ok(true);
        }

        let Some(image_url) = self.storage.get_cocktail_image_url(cocktail_id)? else {
            tracing::debug!("No thumbnail URL stored for cocktail {}", cocktail_id);
            return Ok(false);
        };

        let image_path = self
            .config
            .output
            .cocktail_images_dir()
            .join(format!("{}.jpg", cocktail_id));

        if !self
            .fetcher
            .fetch_binary_to_path(&image_url, &image_path)
            .await
        {
            return Ok(false);
        }

        self.storage
            .set_cocktail_image_path(cocktail_id, &path_string(&image_path))?;
        self.ledger.record(WorkKind::CocktailImage, cocktail_id)?;

        tracing::info!("Downloaded image for cocktail {}", cocktail_id);
        Ok(true)
    }

    /// Downloads the image of an ingredient
    ///
    /// Uses the URL stored with the ingredient row when there is one, and
    /// otherwise derives it from the name.
    pub async fn download_ingredient_image(&mut self, name: &str) -> Result<bool, MirrorError> {
        if self.ledger.is_done(WorkKind::IngredientImage, name) {
            return Ok(true);
        }

        let image_url = match self
            .storage
            .get_ingredient(name)?
            .and_then(|ingredient| ingredient.image_url)
            .filter(|url| !url.trim().is_empty())
        {
            Some(url) => url,
            None => match self.config.source.ingredient_image_url(name) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::warn!("No image URL for ingredient '{}': {}", name, e);
                    return Ok(false);
                }
            },
        };

        let image_path = self
            .config
            .output
            .ingredient_images_dir()
            .join(format!("{}.png", sanitize_file_name(name)));

        if !self
            .fetcher
            .fetch_binary_to_path(&image_url, &image_path)
            .await
        {
            return Ok(false);
        }

        // The file stays on disk; the next run links it once the row exists
        if !self
            .storage
            .set_ingredient_image_path(name, &path_string(&image_path))?
        {
            tracing::debug!("No ingredient row for '{}' to attach its image to", name);
            return Ok(false);
        }
        self.ledger.record(WorkKind::IngredientImage, name)?;

        tracing::info!("Downloaded image for ingredient: {}", name);
        Ok(true)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs the complete mirror pipeline
///
/// This is the main entry point: it opens the store, loads (or resets) the
/// ledger, runs all five stages and writes the snapshot.
///
/// # Example
///
/// ```no_run
/// use cocktail_mirror::config::Config;
/// use cocktail_mirror::crawler::run_pipeline;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_pipeline(Config::default(), false).await?;
/// println!("Exported {} cocktails", summary.snapshot.cocktails);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(config: Config, fresh: bool) -> Result<RunSummary, MirrorError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
