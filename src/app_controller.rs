use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::classifier::clean_subtitle_file;
use crate::container::{clean_container, convert_to_mkv, ContainerOutcome, MediaToolbox, SystemToolbox};
use crate::file_utils::{FileManager, MediaKind};
use crate::prompt::{ConsolePrompt, DecisionPrompt};
use crate::store::{CouchStore, DecisionCache, DecisionStore, StopwordRegistry};

// @module: Application controller dispatching inputs to the two pipelines

/// Summary of one batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files processed to a terminal success state
    pub processed: usize,

    /// Files skipped or left in their last safe state after a failure
    pub failed: usize,

    /// Total subtitle cues removed across all documents
    pub cues_removed: usize,
}

/// Main application controller.
///
/// Owns the decision cache, the stopword registry and the injected
/// capabilities (store, toolbox, prompt) for the duration of one batch run.
/// Files are processed strictly one at a time so the backup protocol for one
/// container can never race another file on the same path.
pub struct Controller {
    /// App configuration
    #[allow(dead_code)]
    config: Config,

    /// Remote decision store
    store: Box<dyn DecisionStore>,

    /// External media tools
    toolbox: Box<dyn MediaToolbox>,

    /// Interactive decision source
    prompt: Box<dyn DecisionPrompt>,

    /// Per-run decision cache
    cache: DecisionCache,

    /// Stopword matchers, loaded once per run
    stopwords: StopwordRegistry,
}

impl Controller {
    /// Create a controller with production collaborators
    pub async fn with_config(config: Config) -> Result<Self> {
        let store = CouchStore::new(&config.store)?;

        if let Err(e) = store.ensure_databases().await {
            warn!("Could not ensure store databases exist: {}", e);
        }

        Self::with_parts(
            config,
            Box::new(store),
            Box::new(SystemToolbox::new()),
            Box::new(ConsolePrompt::new()),
        )
        .await
    }

    /// Create a controller with injected collaborators (used by tests)
    pub async fn with_parts(
        config: Config,
        store: Box<dyn DecisionStore>,
        toolbox: Box<dyn MediaToolbox>,
        prompt: Box<dyn DecisionPrompt>,
    ) -> Result<Self> {
        let mut cache = DecisionCache::new();
        if let Err(e) = cache.reload(store.as_ref()).await {
            // Lookup failure degrades to "undecided", never aborts the run
            warn!("Failed to load decision cache, all cues treated as undecided: {}", e);
        }

        let stopwords = StopwordRegistry::load(store.as_ref()).await;
        debug!(
            "Controller ready: {} cached decisions, {} stopword patterns",
            cache.len(),
            stopwords.len()
        );

        Ok(Controller {
            config,
            store,
            toolbox,
            prompt,
            cache,
            stopwords,
        })
    }

    /// Process one input path: a file directly, or every supported file
    /// under a directory, sequentially
    pub async fn run(&mut self, input: &Path) -> Result<BatchSummary> {
        let files = if FileManager::dir_exists(input) {
            FileManager::find_media_files(input)?
        } else if FileManager::file_exists(input) {
            vec![input.to_path_buf()]
        } else {
            return Err(anyhow::anyhow!("Input path does not exist: {:?}", input));
        };

        self.run_batch(&files).await
    }

    /// Process a batch of files one at a time.
    ///
    /// Per-file failures are logged and leave the file in its last safe
    /// state; the batch always continues.
    pub async fn run_batch(&mut self, files: &[PathBuf]) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for file in files {
            match self.process_file(file).await {
                Ok(removed) => {
                    summary.processed += 1;
                    summary.cues_removed += removed;
                }
                Err(e) => {
                    error!("Failed to process {}: {:#}", file.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Batch done: {} processed, {} failed, {} cue(s) removed",
            summary.processed, summary.failed, summary.cues_removed
        );

        Ok(summary)
    }

    /// Route one file to the matching pipeline; returns removed cue count
    async fn process_file(&mut self, path: &Path) -> Result<usize> {
        match MediaKind::from_path(path) {
            MediaKind::SubtitleVtt | MediaKind::SubtitleSrt => {
                let report = clean_subtitle_file(
                    path,
                    self.store.as_ref(),
                    &mut self.cache,
                    &self.stopwords,
                    self.prompt.as_ref(),
                )
                .await?;

                debug!(
                    "{}: {} cue(s) seen, {} removed",
                    report.path.display(),
                    report.total,
                    report.removed
                );
                Ok(report.removed)
            }
            MediaKind::Matroska => {
                self.clean_container_reporting(path).await?;
                Ok(0)
            }
            MediaKind::Mp4 => {
                let converted = convert_to_mkv(path, self.toolbox.as_ref()).await?;
                self.clean_container_reporting(&converted).await?;
                Ok(0)
            }
            MediaKind::Unknown => {
                debug!("Skipping unsupported file: {}", path.display());
                Ok(0)
            }
        }
    }

    /// Run the container state machine and turn a rollback into a reported
    /// failure so the batch counts it
    async fn clean_container_reporting(&self, path: &Path) -> Result<()> {
        match clean_container(path, self.toolbox.as_ref()).await? {
            ContainerOutcome::CleanedMetadata | ContainerOutcome::Committed => Ok(()),
            ContainerOutcome::RolledBack { reason } => {
                Err(anyhow::anyhow!("rewrite rolled back: {}", reason))
            }
        }
    }
}
