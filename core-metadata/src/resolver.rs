//! # Resolution Engine
//!
//! Resolves one kind of content (lyrics or artwork) for a [`Query`] from an
//! ordered list of providers.
//!
//! ## Strategy
//!
//! 1. The verbatim query is sent to every provider at once. The first
//!    non-empty answer wins; the stragglers are aborted. The whole race is
//!    bounded by the configured race deadline.
//! 2. If the race produces nothing, the looser query variants are tried in
//!    order, one provider at a time, until something answers.
//! 3. Otherwise the result is [`MetadataError::NotFound`].
//!
//! Every provider call is guarded: a panic becomes [`ProviderError::Fault`]
//! and a call exceeding the provider timeout becomes
//! [`ProviderError::Timeout`]. Provider errors are logged at debug level and
//! never returned to the caller.

use bytes::Bytes;
use core_runtime::config::CoreConfig;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::error::{ContentKind, MetadataError, ProviderError, Result};
use crate::provider::{Content, ContentProvider, ProviderList};
use crate::query::{generate_variants, Query, SearchTerms};

pub type LyricsEngine = ResolutionEngine<String>;
pub type ArtworkEngine = ResolutionEngine<Bytes>;

pub struct ResolutionEngine<C: Content> {
    kind: ContentKind,
    providers: ProviderList<C>,
    provider_timeout: Duration,
    race_deadline: Duration,
}

impl<C: Content> ResolutionEngine<C> {
    pub fn new(kind: ContentKind, providers: ProviderList<C>, config: &CoreConfig) -> Self {
        Self {
            kind,
            providers,
            provider_timeout: config.provider_timeout,
            race_deadline: config.race_deadline,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Provider ids in priority order
    pub fn sources(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    #[instrument(skip_all, fields(kind = %self.kind, title = %query.title, artist = %query.artist))]
    pub async fn resolve(&self, query: &Query) -> Result<C> {
        if query.is_blank() {
            return Err(MetadataError::Validation(
                "title, artist or album is required".to_string(),
            ));
        }

        let variants = generate_variants(&query.title, &query.artist);
        let album = query.album.as_deref();

        let Some((primary, fallbacks)) = variants.split_first() else {
            return Err(MetadataError::NotFound(self.kind));
        };

        if let Some(content) = self.race(SearchTerms::from_variant(primary, album)).await {
            return Ok(content);
        }

        for variant in fallbacks {
            let terms = SearchTerms::from_variant(variant, album);
            debug!(variant = ?variant.kind, title = %terms.title, artist = %terms.artist, "Trying fallback variant");

            for provider in &self.providers {
                match guarded_fetch(provider.as_ref(), &terms, self.provider_timeout).await {
                    Ok(content) if !content.is_empty_content() => {
                        debug!(source = provider.source(), variant = ?variant.kind, "Resolved on fallback");
                        return Ok(content);
                    }
                    Ok(_) => debug!(source = provider.source(), "Empty content"),
                    Err(e) => debug!(source = provider.source(), error = %e, "Provider attempt failed"),
                }
            }
        }

        debug!("All providers and variants exhausted");
        Err(MetadataError::NotFound(self.kind))
    }

    /// Run every provider concurrently; first non-empty content wins
    async fn race(&self, terms: SearchTerms) -> Option<C> {
        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let terms = terms.clone();
            let limit = self.provider_timeout;
            tasks.spawn(async move {
                let source = provider.source();
                (source, guarded_fetch(provider.as_ref(), &terms, limit).await)
            });
        }

        let first_hit = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((source, Ok(content))) if !content.is_empty_content() => {
                        return Some((source, content));
                    }
                    Ok((source, Ok(_))) => debug!(source, "Empty content"),
                    Ok((source, Err(e))) => debug!(source, error = %e, "Provider attempt failed"),
                    Err(e) => debug!(error = %e, "Provider task did not complete"),
                }
            }
            None
        };

        let outcome = tokio::time::timeout(self.race_deadline, first_hit).await;
        // Dropping the set aborts whatever is still running
        drop(tasks);

        match outcome {
            Ok(Some((source, content))) => {
                debug!(source, "Race won");
                Some(content)
            }
            Ok(None) => None,
            Err(_) => {
                debug!(deadline = ?self.race_deadline, "Race deadline reached");
                None
            }
        }
    }
}

/// One provider call with panic capture and a backstop timeout
pub(crate) async fn guarded_fetch<C: Content>(
    provider: &dyn ContentProvider<Content = C>,
    terms: &SearchTerms,
    limit: Duration,
) -> std::result::Result<C, ProviderError> {
    let source = provider.source();
    let attempt = AssertUnwindSafe(provider.fetch(terms)).catch_unwind();

    match tokio::time::timeout(limit, attempt).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(ProviderError::Fault(format!(
            "{} panicked: {}",
            source,
            panic_message(panic.as_ref())
        ))),
        Err(_) => Err(ProviderError::Timeout(format!(
            "{} gave no answer within {:?}",
            source, limit
        ))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
