//! Deezer artwork provider
//!
//! Searches the public Deezer API by artist and album and downloads the
//! largest album cover the first hit advertises.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{album_search_term, download_image, execute, parse_json};
use crate::error::ProviderError;
use crate::provider::ContentProvider;
use crate::query::SearchTerms;

const DEEZER_API_BASE: &str = "https://api.deezer.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Album {
    cover_xl: Option<String>,
    cover_big: Option<String>,
    cover_medium: Option<String>,
    cover: Option<String>,
}

impl Album {
    /// Largest non-empty cover URL
    fn best_cover(&self) -> Option<&str> {
        [&self.cover_xl, &self.cover_big, &self.cover_medium, &self.cover]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .find(|url| !url.is_empty())
    }
}

pub struct DeezerProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl DeezerProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            base_url: DEEZER_API_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ContentProvider for DeezerProvider {
    type Content = Bytes;

    fn source(&self) -> &'static str {
        "deezer"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Bytes, ProviderError> {
        let term = album_search_term(&terms.title, &terms.artist, terms.album_or_empty())?;
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&term));

        let response = execute(
            self.http_client.as_ref(),
            HttpRequest::get(url).timeout(self.timeout),
            self.source(),
        )
        .await?;
        let search: SearchResponse = parse_json(&response, self.source())?;

        let cover_url = search
            .data
            .first()
            .and_then(|track| track.album.as_ref())
            .and_then(Album::best_cover)
            .ok_or_else(|| ProviderError::Miss(format!("no deezer cover for '{}'", term)))?
            .to_string();

        debug!(term = %term, url = %cover_url, "Deezer cover found");
        download_image(
            self.http_client.as_ref(),
            HttpRequest::get(cover_url).timeout(self.timeout),
            self.source(),
        )
        .await
    }
}
