//! MusicBrainz + Cover Art Archive artwork provider
//!
//! ## API Endpoints
//!
//! - **Search**: `https://musicbrainz.org/ws/2/release/?query={query}&fmt=json&limit=1`
//! - **Cover Art**: `https://coverartarchive.org/release/{mbid}/front-500`, then `/front`
//!
//! MusicBrainz rejects anonymous clients, so every search carries the
//! configured User-Agent (`ApplicationName/Version (contact)`).

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{download_image, execute, parse_json, strip_qualifiers};
use crate::error::ProviderError;
use crate::provider::ContentProvider;
use crate::query::SearchTerms;

const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

const COVERART_ARCHIVE_BASE: &str = "https://coverartarchive.org";

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    id: String,
    #[serde(default)]
    title: String,
}

pub struct MusicBrainzProvider {
    http_client: Arc<dyn HttpClient>,
    user_agent: String,
    api_base: String,
    cover_art_base: String,
    timeout: Duration,
}

impl MusicBrainzProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            user_agent: config.user_agent.clone(),
            api_base: MUSICBRAINZ_API_BASE.to_string(),
            cover_art_base: COVERART_ARCHIVE_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        cover_art_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.cover_art_base = cover_art_base.into();
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    async fn search_release(&self, artist: &str, release: &str) -> Result<Release, ProviderError> {
        let query = build_query(artist, release);
        let url = format!(
            "{}/release/?query={}&fmt=json&limit=1",
            self.api_base,
            urlencoding::encode(&query)
        );

        let response = execute(self.http_client.as_ref(), self.request(url), self.source()).await?;
        let search: ReleaseSearchResponse = parse_json(&response, self.source())?;

        search
            .releases
            .into_iter()
            .find(|r| !r.id.is_empty())
            .ok_or_else(|| ProviderError::Miss(format!("no musicbrainz release for {}", query)))
    }
}

/// Lucene query for the release search; quotes in the terms are dropped
pub(crate) fn build_query(artist: &str, release: &str) -> String {
    let artist = artist.replace('"', "");
    let release = release.replace('"', "");
    if artist.trim().is_empty() {
        format!("release:\"{}\"", release.trim())
    } else {
        format!("artist:\"{}\" AND release:\"{}\"", artist.trim(), release.trim())
    }
}

#[async_trait]
impl ContentProvider for MusicBrainzProvider {
    type Content = Bytes;

    fn source(&self) -> &'static str {
        "musicbrainz"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Bytes, ProviderError> {
        let album = strip_qualifiers(terms.album_or_empty());
        let release = if album.is_empty() {
            strip_qualifiers(&terms.title)
        } else {
            album
        };
        if release.is_empty() {
            return Err(ProviderError::Validation(
                "album or title is required".to_string(),
            ));
        }

        let found = self.search_release(&terms.artist, &release).await?;
        debug!(release_id = %found.id, title = %found.title, "MusicBrainz release found");

        let sized = format!("{}/release/{}/front-500", self.cover_art_base, found.id);
        match download_image(
            self.http_client.as_ref(),
            self.request(sized),
            self.source(),
        )
        .await
        {
            Ok(image) => Ok(image),
            Err(e) => {
                debug!(error = %e, "No 500px cover, trying full size");
                let full = format!("{}/release/{}/front", self.cover_art_base, found.id);
                download_image(self.http_client.as_ref(), self.request(full), self.source()).await
            }
        }
    }
}
