//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, tag storage,
//! file discovery) into the resolution core. Desktop hosts enable the
//! `desktop-shims` feature, which pulls in `bridge-desktop` and exposes
//! [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{
    discovery::{DiscoveryRequest, FileWalker},
    http::HttpClient,
    tags::TagStore,
};
use core_metadata::{
    artwork_providers, lyrics_providers, ArtworkCache, ArtworkEngine, BatchOptions,
    BatchOrchestrator, BatchProgress, BatchSummary, ContentKind, FileResult, LyricsEngine,
    MetadataError, ResolutionEngine,
};
use core_runtime::config::CoreConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub tag_store: Arc<dyn TagStore>,
    pub file_walker: Arc<dyn FileWalker>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tag_store: Arc<dyn TagStore>,
        file_walker: Arc<dyn FileWalker>,
    ) -> Self {
        Self {
            http_client,
            tag_store,
            file_walker,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    deps: Arc<CoreDependencies>,
    cache: Arc<ArtworkCache>,
    orchestrator: Arc<BatchOrchestrator>,
}

impl CoreService {
    /// Create a new service from a validated configuration and the provided
    /// dependencies.
    pub fn new(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let lyrics: LyricsEngine = ResolutionEngine::new(
            ContentKind::Lyrics,
            lyrics_providers(Arc::clone(&deps.http_client), &config),
            &config,
        );
        let artwork: ArtworkEngine = ResolutionEngine::new(
            ContentKind::Artwork,
            artwork_providers(Arc::clone(&deps.http_client), &config),
            &config,
        );
        debug!(
            lyrics = ?lyrics.sources(),
            artwork = ?artwork.sources(),
            "Providers configured"
        );

        let cache = Arc::new(match config.artwork_cache_capacity {
            Some(capacity) => ArtworkCache::with_capacity(capacity),
            None => ArtworkCache::new(),
        });

        let orchestrator = BatchOrchestrator::new(
            Arc::new(lyrics),
            Arc::new(artwork),
            Arc::clone(&cache),
            Arc::clone(&deps.tag_store),
            Arc::clone(&deps.file_walker),
        );

        Ok(Self {
            config: Arc::new(config),
            deps: Arc::new(deps),
            cache,
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn artwork_cache(&self) -> Arc<ArtworkCache> {
        Arc::clone(&self.cache)
    }

    /// Resolve lyrics and/or artwork for every file matching `request`.
    ///
    /// Only pre-flight problems (missing directory, bad pattern) are
    /// returned as errors; per-file failures are counted in the summary.
    pub async fn run_batch(
        &self,
        request: &DiscoveryRequest,
        options: &BatchOptions,
        progress: Arc<dyn BatchProgress>,
        cancel: CancellationToken,
    ) -> Result<BatchSummary> {
        info!(
            lyrics = options.lyrics,
            artwork = options.artwork,
            force = options.force,
            recursive = request.recursive,
            "Running batch"
        );
        let summary = self
            .orchestrator
            .run_with(request, options, progress, cancel)
            .await?;
        Ok(summary)
    }

    /// Resolve a single file.
    pub async fn fetch_file(&self, path: &Path, options: &BatchOptions) -> Result<FileResult> {
        if !path.is_file() {
            return Err(MetadataError::Config(format!("{} is not a file", path.display())).into());
        }
        Ok(self.orchestrator.process_file(path, options).await)
    }
}

/// Build the desktop bridge set for `config`.
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn desktop_dependencies(config: &CoreConfig) -> Result<CoreDependencies> {
    use bridge_desktop::{LoftyTagStore, ReqwestHttpClient, WalkdirFileWalker};

    let http = ReqwestHttpClient::new(&config.user_agent, config.provider_timeout)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    Ok(CoreDependencies::new(
        Arc::new(http),
        Arc::new(LoftyTagStore::new()),
        Arc::new(WalkdirFileWalker::new()),
    ))
}

/// Convenience bootstrapper for desktop hosts.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::CoreConfig;
/// use core_service::bootstrap_desktop;
///
/// let config = CoreConfig::load(None)?;
/// let core = bootstrap_desktop(config)?;
/// let workers = core.config().batch_workers;
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn bootstrap_desktop(config: CoreConfig) -> Result<CoreService> {
    let deps = desktop_dependencies(&config)?;
    CoreService::new(config, deps)
}
