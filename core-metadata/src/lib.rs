//! # Lyrics & Artwork Resolution
//!
//! Resolves missing lyrics and cover artwork for audio files by querying
//! several independent providers and writing back whatever is found.
//!
//! ## Overview
//!
//! - [`query`] - search-term normalisation and ordered query variants
//! - [`providers`] - one adapter per external source (Genius, AZLyrics,
//!   Lyrics.ovh, ChartLyrics, Deezer, iTunes, MusicBrainz)
//! - [`matching`] - confidence scoring of search hits
//! - [`resolver`] - races providers, then sweeps fallback variants
//! - [`cache`] - process-lifetime artwork cache
//! - [`batch`] - bounded worker pool over a directory of files

pub mod batch;
pub mod cache;
pub mod error;
pub mod matching;
pub mod provider;
pub mod providers;
pub mod query;
pub mod resolver;
pub mod text;

pub use batch::{
    BatchOptions, BatchOrchestrator, BatchProgress, BatchStats, BatchSummary, FileResult,
    NoProgress,
};
pub use cache::ArtworkCache;
pub use error::{ContentKind, MetadataError, ProviderError, Result};
pub use provider::{Content, ContentProvider, ProviderList};
pub use providers::{artwork_providers, lyrics_providers};
pub use query::{generate_variants, Query, SearchTerms, SearchVariant, VariantKind};
pub use resolver::{ArtworkEngine, LyricsEngine, ResolutionEngine};
