//! External Content Providers
//!
//! Lyrics, in priority order:
//! - Genius (search API + page scrape, optional bearer token)
//! - AZLyrics (page scrape)
//! - Lyrics.ovh (JSON API)
//! - ChartLyrics (XML API)
//!
//! Artwork, in priority order:
//! - Deezer (search API)
//! - iTunes (search API)
//! - MusicBrainz + Cover Art Archive
//!
//! Every provider issues one request per step, with the configured timeout,
//! and treats a non-2xx status as a miss.

pub mod azlyrics;
pub mod chartlyrics;
pub mod deezer;
pub mod genius;
pub mod itunes;
pub mod lyrics_ovh;
pub mod musicbrainz;

pub use azlyrics::AzLyricsProvider;
pub use chartlyrics::ChartLyricsProvider;
pub use deezer::DeezerProvider;
pub use genius::GeniusProvider;
pub use itunes::ItunesProvider;
pub use lyrics_ovh::LyricsOvhProvider;
pub use musicbrainz::MusicBrainzProvider;

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::ProviderList;

/// Browser-like user agent for the scraped lyric sites
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

static QUALIFIERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*[\[(].*?[\])]").unwrap());

/// Lyrics providers in racing/fallback priority order
pub fn lyrics_providers(
    http_client: Arc<dyn HttpClient>,
    config: &CoreConfig,
) -> ProviderList<String> {
    vec![
        Arc::new(GeniusProvider::new(Arc::clone(&http_client), config)),
        Arc::new(AzLyricsProvider::new(Arc::clone(&http_client), config)),
        Arc::new(LyricsOvhProvider::new(Arc::clone(&http_client), config)),
        Arc::new(ChartLyricsProvider::new(http_client, config)),
    ]
}

/// Artwork providers in racing/fallback priority order
pub fn artwork_providers(
    http_client: Arc<dyn HttpClient>,
    config: &CoreConfig,
) -> ProviderList<Bytes> {
    vec![
        Arc::new(DeezerProvider::new(Arc::clone(&http_client), config)),
        Arc::new(ItunesProvider::new(Arc::clone(&http_client), config)),
        Arc::new(MusicBrainzProvider::new(http_client, config)),
    ]
}

/// Execute `request`, turning transport failures and non-2xx statuses into
/// provider errors
pub(crate) async fn execute(
    http_client: &dyn HttpClient,
    request: HttpRequest,
    provider: &'static str,
) -> Result<HttpResponse, ProviderError> {
    let url = request.url.clone();
    let response = http_client.execute(request).await?;

    if response.is_success() {
        return Ok(response);
    }

    debug!(provider, url = %url, status = response.status, "Non-success status");
    if response.status == 404 {
        Err(ProviderError::Miss(format!("{} returned 404", provider)))
    } else {
        Err(ProviderError::Http {
            provider,
            status: response.status,
        })
    }
}

/// Download an image body; an empty body is a miss
pub(crate) async fn download_image(
    http_client: &dyn HttpClient,
    request: HttpRequest,
    provider: &'static str,
) -> Result<Bytes, ProviderError> {
    let response = execute(http_client, request, provider).await?;
    if response.body.is_empty() {
        return Err(ProviderError::Miss(format!("{} returned an empty image", provider)));
    }
    Ok(response.body)
}

/// Parse a JSON body, reporting failures as [`ProviderError::Parse`]
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    response: &HttpResponse,
    provider: &'static str,
) -> Result<T, ProviderError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| ProviderError::Parse(format!("{}: {}", provider, e)))
}

/// Fail with `Validation` when `value` is blank
pub(crate) fn require<'a>(value: &'a str, what: &str) -> Result<&'a str, ProviderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ProviderError::Validation(format!("{} is required", what)))
    } else {
        Ok(trimmed)
    }
}

/// Drop `(Deluxe Edition)`-style qualifiers and collapse whitespace
pub(crate) fn strip_qualifiers(s: &str) -> String {
    let stripped = QUALIFIERS.replace_all(s.trim(), "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `"{artist} {album}"` with qualifiers removed, falling back to the title
pub(crate) fn album_search_term(
    title: &str,
    artist: &str,
    album: &str,
) -> Result<String, ProviderError> {
    let term = format!("{} {}", strip_qualifiers(artist), strip_qualifiers(album));
    let term = term.trim();
    if !term.is_empty() {
        return Ok(term.to_string());
    }
    let title = strip_qualifiers(title);
    if title.is_empty() {
        return Err(ProviderError::Validation(
            "artist, album or title is required".to_string(),
        ));
    }
    Ok(title)
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::MockHttp;

    #[test]
    fn test_strip_qualifiers() {
        assert_eq!(
            strip_qualifiers("  Abbey Road (Remastered 2009) [Deluxe] "),
            "Abbey Road"
        );
        assert_eq!(strip_qualifiers("Let  It   Be"), "Let It Be");
    }

    #[test]
    fn test_album_search_term() {
        assert_eq!(
            album_search_term("Come Together", "The Beatles", "Abbey Road (Super Deluxe)").unwrap(),
            "The Beatles Abbey Road"
        );
        assert_eq!(
            album_search_term("Come Together", "", "").unwrap(),
            "Come Together"
        );
        assert!(matches!(
            album_search_term("", " ", ""),
            Err(ProviderError::Validation(_))
        ));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("  Queen ", "artist").unwrap(), "Queen");
        assert!(matches!(
            require("   ", "artist"),
            Err(ProviderError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_maps_statuses() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| r.url.ends_with("/missing"))
            .returning(|_| Ok(HttpResponse::new(404, "")));
        http.expect_execute()
            .withf(|r| r.url.ends_with("/busy"))
            .returning(|_| Ok(HttpResponse::new(503, "")));
        http.expect_execute()
            .withf(|r| r.url.ends_with("/slow"))
            .returning(|_| {
                Err(bridge_traits::BridgeError::Timeout("slow".to_string()))
            });

        let missing = execute(&http, HttpRequest::get("http://x/missing"), "test").await;
        assert!(matches!(missing, Err(ProviderError::Miss(_))));

        let busy = execute(&http, HttpRequest::get("http://x/busy"), "test").await;
        assert!(matches!(
            busy,
            Err(ProviderError::Http { status: 503, .. })
        ));

        let slow = execute(&http, HttpRequest::get("http://x/slow"), "test").await;
        assert!(matches!(slow, Err(ProviderError::Timeout(_))));
    }

    #[test]
    fn test_factories_keep_priority_order() {
        let config = CoreConfig::default();
        let http: Arc<dyn HttpClient> = Arc::new(MockHttp::new());

        let lyrics: Vec<_> = lyrics_providers(Arc::clone(&http), &config)
            .iter()
            .map(|p| p.source())
            .collect();
        assert_eq!(lyrics, vec!["genius", "azlyrics", "lyrics.ovh", "chartlyrics"]);

        let artwork: Vec<_> = artwork_providers(http, &config)
            .iter()
            .map(|p| p.source())
            .collect();
        assert_eq!(artwork, vec!["deezer", "itunes", "musicbrainz"]);
    }
}
