//! # Batch Orchestrator
//!
//! Resolves lyrics and artwork for every audio file under a directory with a
//! fixed-size pool of workers.
//!
//! ## Overview
//!
//! - Pre-flight checks the root directory and the file pattern; problems
//!   there are the only errors that abort a batch.
//! - All discovered files are queued up front, then `N` workers
//!   (`1..=20`) drain the queue.
//! - Each file gets exactly one [`FileResult`]. Failures, including panics,
//!   are recorded and counted without affecting other files.
//! - [`BatchStats`] counters are atomic and can be read at any time; a
//!   [`BatchProgress`] observer is told about every finished file.
//!
//! ```text
//! FileWalker ──> job queue ──> worker 1..N ──> LyricsEngine ─┐
//!                                         └──> ArtworkCache / ArtworkEngine
//!                                                            └──> TagStore
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let orchestrator = BatchOrchestrator::new(lyrics, artwork, cache, tag_store, walker);
//! let request = DiscoveryRequest::new("/music").with_recursive(true);
//! let summary = orchestrator
//!     .run(&request, &BatchOptions::default().with_workers(8))
//!     .await?;
//! println!("{} files, {} updated", summary.processed, summary.updated);
//! ```

use bridge_traits::discovery::{DiscoveryRequest, FileWalker};
use bridge_traits::tags::{TagStore, TagUpdates, TrackTags};
use bytes::Bytes;
use core_runtime::config::{clamp_workers, DEFAULT_BATCH_WORKERS};
use core_runtime::logging::strip_path;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::ArtworkCache;
use crate::error::{ContentKind, MetadataError, Result};
use crate::query::{derive_title_from_filename, Query};
use crate::resolver::{panic_message, ArtworkEngine, LyricsEngine};

// =============================================================================
// Options
// =============================================================================

/// What a batch should resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub lyrics: bool,
    pub artwork: bool,
    /// Resolve even when the file already has the field
    pub force: bool,
    /// Requested worker count, clamped to `1..=20`
    pub workers: usize,
    /// Remove existing lyrics unless new lyrics are written
    pub clear_lyrics: bool,
    /// Remove existing artwork unless new artwork is written
    pub clear_artwork: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            lyrics: true,
            artwork: true,
            force: false,
            workers: DEFAULT_BATCH_WORKERS,
            clear_lyrics: false,
            clear_artwork: false,
        }
    }
}

impl BatchOptions {
    pub fn with_lyrics(mut self, enabled: bool) -> Self {
        self.lyrics = enabled;
        self
    }

    pub fn with_artwork(mut self, enabled: bool) -> Self {
        self.artwork = enabled;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_clear_lyrics(mut self, clear: bool) -> Self {
        self.clear_lyrics = clear;
        self
    }

    pub fn with_clear_artwork(mut self, clear: bool) -> Self {
        self.clear_artwork = clear;
        self
    }

    /// Nothing to resolve and nothing to clear
    pub fn is_noop(&self) -> bool {
        !self.lyrics && !self.artwork && !self.clear_lyrics && !self.clear_artwork
    }
}

// =============================================================================
// Progress Tracking
// =============================================================================

/// Point-in-time copy of the batch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} updated={} skipped={} errors={}",
            self.processed, self.updated, self.skipped, self.errors
        )
    }
}

/// Counters shared by all workers of one batch
#[derive(Debug, Default)]
pub struct BatchStats {
    processed: AtomicUsize,
    updated: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
}

impl BatchStats {
    pub fn snapshot(&self) -> BatchSummary {
        BatchSummary {
            processed: self.processed.load(Ordering::SeqCst),
            updated: self.updated.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
        }
    }

    fn record(&self, result: &FileResult) -> BatchSummary {
        if result.error.is_some() {
            self.errors.fetch_add(1, Ordering::SeqCst);
        } else if result.updated {
            self.updated.fetch_add(1, Ordering::SeqCst);
        } else {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
        self.snapshot()
    }
}

/// Outcome for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub succeeded: bool,
    pub updated: bool,
    pub error: Option<String>,
}

impl FileResult {
    fn updated(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            succeeded: true,
            updated: true,
            error: None,
        }
    }

    fn skipped(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            succeeded: true,
            updated: false,
            error: None,
        }
    }

    fn failed(path: &Path, error: &MetadataError) -> Self {
        Self {
            path: path.to_path_buf(),
            succeeded: false,
            updated: false,
            error: Some(error.to_string()),
        }
    }
}

/// Observer for batch progress
pub trait BatchProgress: Send + Sync {
    /// Called once after discovery with the number of queued files
    fn on_start(&self, _total: usize) {}

    /// Called after each file with the counters including that file
    fn on_file(&self, result: &FileResult, stats: BatchSummary);

    fn on_finish(&self, _summary: BatchSummary) {}
}

/// Progress observer that ignores everything
pub struct NoProgress;

impl BatchProgress for NoProgress {
    fn on_file(&self, _result: &FileResult, _stats: BatchSummary) {}
}

// =============================================================================
// Per-file processing
// =============================================================================

enum FileOutcome {
    Updated,
    Skipped,
}

/// Everything a worker needs to process one file
struct FileProcessor {
    lyrics: Arc<LyricsEngine>,
    artwork: Arc<ArtworkEngine>,
    cache: Arc<ArtworkCache>,
    tag_store: Arc<dyn TagStore>,
}

impl FileProcessor {
    /// Process one file, converting a panic into a `TaskFault` result
    async fn process_guarded(&self, path: &Path, options: &BatchOptions) -> FileResult {
        match AssertUnwindSafe(self.process(path, options))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let err = MetadataError::TaskFault(panic_message(panic.as_ref()));
                error!(file = %file_label(path), error = %err, "File processing panicked");
                FileResult::failed(path, &err)
            }
        }
    }

    #[instrument(skip_all, fields(file = %file_label(path)))]
    async fn process(&self, path: &Path, options: &BatchOptions) -> FileResult {
        match self.try_process(path, options).await {
            Ok(FileOutcome::Updated) => {
                debug!("Tags updated");
                FileResult::updated(path)
            }
            Ok(FileOutcome::Skipped) => {
                debug!("Nothing to resolve");
                FileResult::skipped(path)
            }
            Err(e) => {
                warn!(error = %e, "File failed");
                FileResult::failed(path, &e)
            }
        }
    }

    async fn try_process(&self, path: &Path, options: &BatchOptions) -> Result<FileOutcome> {
        let tags = self.tag_store.read_tags(path).await.map_err(|e| {
            MetadataError::TagStore(format!("reading {}: {}", file_label(path), e))
        })?;

        let want_lyrics = options.lyrics && (options.force || !tags.has_lyrics());
        let want_artwork = options.artwork && (options.force || !tags.has_artwork());
        let clearing = options.clear_lyrics || options.clear_artwork;
        if !want_lyrics && !want_artwork && !clearing {
            return Ok(FileOutcome::Skipped);
        }

        let query = query_for(path, &tags);
        let key = path.to_string_lossy();

        let lyrics = async {
            if want_lyrics {
                Some(self.lyrics.resolve(&query).await)
            } else {
                None
            }
        };
        let artwork = async {
            if want_artwork {
                Some(self.resolve_artwork(&key, &query).await)
            } else {
                None
            }
        };
        let (lyrics, artwork) = tokio::join!(lyrics, artwork);

        let mut updates = TagUpdates {
            clear_lyrics: options.clear_lyrics,
            clear_artwork: options.clear_artwork,
            ..Default::default()
        };
        let mut lyrics_error = None;
        let mut artwork_error = None;

        match lyrics {
            Some(Ok(text)) => updates.lyrics = Some(text),
            Some(Err(e)) => lyrics_error = Some(e),
            None => {}
        }
        match artwork {
            Some(Ok(image)) => updates.artwork = Some(image),
            Some(Err(e)) => artwork_error = Some(e),
            None => {}
        }

        // Every attempted lookup failed: an error, not a skip
        if updates.is_empty() {
            return Err(match (lyrics_error, artwork_error) {
                (Some(e), _) | (None, Some(e)) => e,
                (None, None) if want_lyrics => MetadataError::NotFound(ContentKind::Lyrics),
                (None, None) => MetadataError::NotFound(ContentKind::Artwork),
            });
        }

        if let Some(e) = lyrics_error.as_ref().or(artwork_error.as_ref()) {
            debug!(error = %e, "Partial resolution, writing what was found");
        }

        self.tag_store.edit_tags(path, &updates).await.map_err(|e| {
            MetadataError::TagStore(format!("writing {}: {}", file_label(path), e))
        })?;

        Ok(FileOutcome::Updated)
    }

    /// Artwork from the cache, else resolved and cached
    async fn resolve_artwork(&self, key: &str, query: &Query) -> Result<Bytes> {
        if let Some(cached) = self.cache.get(key).await {
            debug!("Artwork cache hit");
            return Ok(cached);
        }
        let image = self.artwork.resolve(query).await?;
        Ok(self.cache.set_if_absent(key, image).await)
    }
}

/// Query from the file's tags, with the title derived from the file name
/// when the tag is missing
fn query_for(path: &Path, tags: &TrackTags) -> Query {
    let title = tags
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_title_from_filename(path));
    let query = Query::new(title, tags.artist.clone().unwrap_or_default());
    match &tags.album {
        Some(album) => query.with_album(album.clone()),
        None => query,
    }
}

/// Report a finished file; a panicking observer must not take its worker down
fn notify_file(progress: &dyn BatchProgress, result: &FileResult, stats: BatchSummary) {
    let notified = std::panic::catch_unwind(AssertUnwindSafe(|| progress.on_file(result, stats)));
    if let Err(panic) = notified {
        error!(
            file = %file_label(&result.path),
            error = %panic_message(panic.as_ref()),
            "Progress observer panicked"
        );
    }
}

fn file_label(path: &Path) -> String {
    strip_path(&path.to_string_lossy()).to_string()
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct BatchOrchestrator {
    processor: Arc<FileProcessor>,
    file_walker: Arc<dyn FileWalker>,
}

impl BatchOrchestrator {
    pub fn new(
        lyrics: Arc<LyricsEngine>,
        artwork: Arc<ArtworkEngine>,
        cache: Arc<ArtworkCache>,
        tag_store: Arc<dyn TagStore>,
        file_walker: Arc<dyn FileWalker>,
    ) -> Self {
        Self {
            processor: Arc::new(FileProcessor {
                lyrics,
                artwork,
                cache,
                tag_store,
            }),
            file_walker,
        }
    }

    /// Run a batch without progress reporting or cancellation
    pub async fn run(
        &self,
        request: &DiscoveryRequest,
        options: &BatchOptions,
    ) -> Result<BatchSummary> {
        self.run_with(request, options, Arc::new(NoProgress), CancellationToken::new())
            .await
    }

    /// Run a batch
    ///
    /// Cancelling `cancel` stops workers from taking new files; files already
    /// in progress finish and are counted.
    #[instrument(skip_all, fields(root = %file_label(&request.root), pattern = %request.pattern))]
    pub async fn run_with(
        &self,
        request: &DiscoveryRequest,
        options: &BatchOptions,
        progress: Arc<dyn BatchProgress>,
        cancel: CancellationToken,
    ) -> Result<BatchSummary> {
        let files = self.discover(request).await?;

        if files.is_empty() {
            info!("No matching files");
            let summary = BatchSummary::default();
            progress.on_finish(summary);
            return Ok(summary);
        }

        let total = files.len();
        let workers = clamp_workers(options.workers);
        info!(files = total, workers, "Starting batch");
        progress.on_start(total);

        let (tx, rx) = mpsc::channel::<PathBuf>(total);
        for path in files {
            tx.send(path)
                .await
                .map_err(|e| MetadataError::TaskFault(format!("job queue closed: {}", e)))?;
        }
        drop(tx);

        let queue = Arc::new(Mutex::new(rx));
        let stats = Arc::new(BatchStats::default());
        let mut pool = JoinSet::new();

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let processor = Arc::clone(&self.processor);
            let stats = Arc::clone(&stats);
            let progress = Arc::clone(&progress);
            let cancel = cancel.clone();
            let options = options.clone();

            pool.spawn(async move {
                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        path = async { queue.lock().await.recv().await } => path,
                    };
                    let Some(path) = next else {
                        break;
                    };

                    let result = processor.process_guarded(&path, &options).await;
                    let snapshot = stats.record(&result);
                    notify_file(progress.as_ref(), &result, snapshot);
                }
                debug!(worker_id, "Worker finished");
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Batch worker failed");
            }
        }

        let summary = stats.snapshot();
        if cancel.is_cancelled() {
            warn!(remaining = total - summary.processed, "Batch cancelled");
        }
        info!(
            processed = summary.processed,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            "Batch complete"
        );
        progress.on_finish(summary);
        Ok(summary)
    }

    /// Resolve one file outside of a batch
    pub async fn process_file(&self, path: &Path, options: &BatchOptions) -> FileResult {
        self.processor.process_guarded(path, options).await
    }

    /// Pre-flight checks followed by discovery
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(&request.root).await.map_err(|e| {
            MetadataError::Config(format!(
                "cannot access directory {}: {}",
                request.root.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(MetadataError::Config(format!(
                "{} is not a directory",
                request.root.display()
            )));
        }

        self.file_walker
            .check_pattern(&request.pattern)
            .map_err(|e| MetadataError::Config(format!("invalid pattern: {}", e)))?;

        let files = self.file_walker.discover(request).await?;
        debug!(count = files.len(), "Discovered files");
        Ok(files)
    }
}
