//! # Content Provider Abstraction
//!
//! A provider is one external source of lyrics or artwork. Providers are
//! stateless: they take search terms, perform a single request/parse cycle,
//! and return content or a [`ProviderError`].

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::query::SearchTerms;

/// Content a provider can resolve
pub trait Content: Clone + Send + Sync + 'static {
    /// Empty content counts as a miss, never as a winner
    fn is_empty_content(&self) -> bool;
}

impl Content for String {
    fn is_empty_content(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Content for Bytes {
    fn is_empty_content(&self) -> bool {
        self.is_empty()
    }
}

/// One external content source
///
/// Implementations apply their own request timeout and must report missing
/// required terms as [`ProviderError::Validation`] without touching the
/// network.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    type Content: Content;

    /// Short identifier used in logs
    fn source(&self) -> &'static str;

    async fn fetch(&self, terms: &SearchTerms) -> Result<Self::Content, ProviderError>;
}

/// Ordered provider list; order is racing and fallback priority
pub type ProviderList<C> = Vec<Arc<dyn ContentProvider<Content = C>>>;
