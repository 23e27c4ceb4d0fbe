//! # Core Configuration Module
//!
//! Runtime settings for lyrics and artwork resolution.
//!
//! ## Overview
//!
//! Configuration is an explicit value: it is built once, validated, and then
//! passed by reference into the resolution engines and the batch
//! orchestrator. Nothing reads ambient globals after startup.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`~/.config/tunefill/config.toml` by default)
//! 3. Environment variables (`GENIUS_API_KEY`, `TUNEFILL_WORKERS`,
//!    `TUNEFILL_LOG_LEVEL`)
//! 4. Explicit builder calls (command-line flags)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .genius_api_token("token")
//!     .provider_timeout(Duration::from_secs(10))
//!     .batch_workers(8)
//!     .build()?;
//! ```
//!
//! ## File format
//!
//! ```toml
//! genius_api_token = "..."
//! provider_timeout_secs = 15
//! race_deadline_secs = 30
//! batch_workers = 5
//! user_agent = "tunefill/0.1 (https://example.org)"
//! artwork_cache_capacity = 512
//! log_level = "info"
//! ```

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LogLevel};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Per-provider request timeout
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Group deadline for the concurrent first-variant race
pub const DEFAULT_RACE_DEADLINE: Duration = Duration::from_secs(30);

/// Default number of concurrent batch workers
pub const DEFAULT_BATCH_WORKERS: usize = 5;

/// Inclusive bounds for the batch worker count
pub const MIN_BATCH_WORKERS: usize = 1;
pub const MAX_BATCH_WORKERS: usize = 20;

/// User agent sent to every provider (MusicBrainz requires one)
pub const DEFAULT_USER_AGENT: &str = concat!(
    "tunefill/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/tunefill/tunefill)"
);

pub const ENV_GENIUS_API_KEY: &str = "GENIUS_API_KEY";
pub const ENV_WORKERS: &str = "TUNEFILL_WORKERS";
pub const ENV_LOG_LEVEL: &str = "TUNEFILL_LOG_LEVEL";

/// Clamp a requested worker count into `[MIN_BATCH_WORKERS, MAX_BATCH_WORKERS]`
pub fn clamp_workers(requested: usize) -> usize {
    requested.clamp(MIN_BATCH_WORKERS, MAX_BATCH_WORKERS)
}

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] or [`CoreConfig::load`] to construct instances.
#[derive(Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Bearer token for the Genius API. `None` runs unauthenticated.
    pub genius_api_token: Option<String>,

    /// Timeout applied to each provider request
    pub provider_timeout: Duration,

    /// Deadline for the first-variant race across all providers
    pub race_deadline: Duration,

    /// Default batch worker count, already clamped
    pub batch_workers: usize,

    /// User agent for outgoing HTTP requests
    pub user_agent: String,

    /// Artwork cache bound. `None` keeps every entry for the process lifetime.
    pub artwork_cache_capacity: Option<usize>,

    /// Minimum log level
    pub log_level: LogLevel,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field(
                "genius_api_token",
                &self
                    .genius_api_token
                    .as_deref()
                    .map(|t| redact_if_sensitive("genius_api_token", t)),
            )
            .field("provider_timeout", &self.provider_timeout)
            .field("race_deadline", &self.race_deadline)
            .field("batch_workers", &self.batch_workers)
            .field("user_agent", &self.user_agent)
            .field("artwork_cache_capacity", &self.artwork_cache_capacity)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            genius_api_token: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            race_deadline: DEFAULT_RACE_DEADLINE,
            batch_workers: DEFAULT_BATCH_WORKERS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            artwork_cache_capacity: None,
            log_level: LogLevel::Info,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tunefill").join("config.toml"))
    }

    /// Load configuration from a TOML file and the process environment.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// when present and silently skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<CoreConfig> {
        Self::load_builder(path)?.build()
    }

    /// Like [`CoreConfig::load`] but returns the builder so callers can layer
    /// command-line overrides on top before validating.
    pub fn load_builder(path: Option<&Path>) -> Result<CoreConfigBuilder> {
        let file = match path {
            Some(path) => Some(FileConfig::read(path)?),
            None => match Self::default_path() {
                Some(default) if default.is_file() => Some(FileConfig::read(&default)?),
                _ => None,
            },
        };

        let mut builder = CoreConfig::builder();
        if let Some(file) = file {
            builder = builder.merge_file(file)?;
        }
        builder.merge_env(|key| std::env::var(key).ok())
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.provider_timeout.is_zero() {
            return Err(Error::Config(
                "Provider timeout must be greater than 0".to_string(),
            ));
        }

        if self.race_deadline.is_zero() {
            return Err(Error::Config(
                "Race deadline must be greater than 0".to_string(),
            ));
        }

        if !(MIN_BATCH_WORKERS..=MAX_BATCH_WORKERS).contains(&self.batch_workers) {
            return Err(Error::Config(format!(
                "Batch workers must be between {} and {}",
                MIN_BATCH_WORKERS, MAX_BATCH_WORKERS
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        if self.artwork_cache_capacity == Some(0) {
            return Err(Error::Config(
                "Artwork cache capacity must be greater than 0 (omit it for an unbounded cache)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// On-disk representation. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    genius_api_token: Option<String>,
    provider_timeout_secs: Option<u64>,
    race_deadline_secs: Option<u64>,
    batch_workers: Option<usize>,
    user_agent: Option<String>,
    artwork_cache_capacity: Option<usize>,
    log_level: Option<String>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default, Clone)]
pub struct CoreConfigBuilder {
    genius_api_token: Option<String>,
    provider_timeout: Option<Duration>,
    race_deadline: Option<Duration>,
    batch_workers: Option<usize>,
    user_agent: Option<String>,
    artwork_cache_capacity: Option<usize>,
    log_level: Option<LogLevel>,
}

impl CoreConfigBuilder {
    /// Set the Genius bearer token. Blank tokens are ignored.
    pub fn genius_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.trim().is_empty() {
            self.genius_api_token = Some(token.trim().to_string());
        }
        self
    }

    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = Some(timeout);
        self
    }

    pub fn race_deadline(mut self, deadline: Duration) -> Self {
        self.race_deadline = Some(deadline);
        self
    }

    /// Set the default worker count. Out-of-range values are clamped on build.
    pub fn batch_workers(mut self, workers: usize) -> Self {
        self.batch_workers = Some(workers);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn artwork_cache_capacity(mut self, capacity: usize) -> Self {
        self.artwork_cache_capacity = Some(capacity);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    fn merge_file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(token) = file.genius_api_token {
            self = self.genius_api_token(token);
        }
        if let Some(secs) = file.provider_timeout_secs {
            self.provider_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = file.race_deadline_secs {
            self.race_deadline = Some(Duration::from_secs(secs));
        }
        if let Some(workers) = file.batch_workers {
            self.batch_workers = Some(workers);
        }
        if let Some(user_agent) = file.user_agent {
            self.user_agent = Some(user_agent);
        }
        if let Some(capacity) = file.artwork_cache_capacity {
            self.artwork_cache_capacity = Some(capacity);
        }
        if let Some(level) = file.log_level {
            self.log_level = Some(level.parse()?);
        }
        Ok(self)
    }

    fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_GENIUS_API_KEY) {
            self = self.genius_api_token(token);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            let workers = workers.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_WORKERS, workers
                ))
            })?;
            self.batch_workers = Some(workers);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(level.parse()?);
        }
        Ok(self)
    }

    /// Builds and validates the final `CoreConfig`.
    pub fn build(self) -> Result<CoreConfig> {
        let defaults = CoreConfig::default();

        let config = CoreConfig {
            genius_api_token: self.genius_api_token,
            provider_timeout: self.provider_timeout.unwrap_or(defaults.provider_timeout),
            race_deadline: self.race_deadline.unwrap_or(defaults.race_deadline),
            batch_workers: clamp_workers(self.batch_workers.unwrap_or(defaults.batch_workers)),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            artwork_cache_capacity: self.artwork_cache_capacity,
            log_level: self.log_level.unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }
}
