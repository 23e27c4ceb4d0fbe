//! iTunes Search API artwork provider

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

const ITUNES_API_BASE: &str = "https://itunes.apple.com";

/// Artwork URLs accept any `NxN` size segment
const UPSCALED_SIZE: &str = "500x500";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AlbumResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumResult {
    artwork_url100: Option<String>,
    artwork_url60: Option<String>,
}

pub struct ItunesProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl ItunesProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            base_url: ITUNES_API_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProviderError> {
        download_image(
            self.http_client.as_ref(),
            HttpRequest::get(url).timeout(self.timeout),
            self.source(),
        )
        .await
    }
}

/// `.../100x100bb.jpg` → `.../500x500bb.jpg`
pub(crate) fn upscale_artwork_url(url: &str) -> String {
    url.replace("100x100", UPSCALED_SIZE)
        .replace("60x60", UPSCALED_SIZE)
}

#[async_trait]
impl ContentProvider for ItunesProvider {
    type Content = Bytes;

    fn source(&self) -> &'static str {
        "itunes"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Bytes, ProviderError> {
        let term = album_search_term(&terms.title, &terms.artist, terms.album_or_empty())?;
        let url = format!(
            "{}/search?term={}&entity=album&limit=1",
            self.base_url,
            urlencoding::encode(&term)
        );

        let response = execute(
            self.http_client.as_ref(),
            HttpRequest::get(url).timeout(self.timeout),
            self.source(),
        )
        .await?;
        let search: SearchResponse = parse_json(&response, self.source())?;

        let original = search
            .results
            .first()
            .and_then(|r| r.artwork_url100.as_deref().or(r.artwork_url60.as_deref()))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::Miss(format!("no itunes artwork for '{}'", term)))?
            .to_string();

        let upscaled = upscale_artwork_url(&original);
        if upscaled == original {
            return self.download(&original).await;
        }

        match self.download(&upscaled).await {
            Ok(image) => Ok(image),
            Err(e) => {
                debug!(error = %e, "Upscaled iTunes artwork unavailable, using original size");
                self.download(&original).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{no_network, MockHttp};
    use bridge_traits::http::HttpResponse;

    const SEARCH: &str = r#"{"resultCount":1,"results":[{"artworkUrl100":"http://img.test/100x100bb.jpg"}]}"#;

    fn provider(http: MockHttp) -> ItunesProvider {
        ItunesProvider::new(Arc::new(http), &CoreConfig::default())
            .with_base_url("http://itunes.test")
    }

    #[test]
    fn test_upscale_artwork_url() {
        assert_eq!(
            upscale_artwork_url("http://a/60x60bb.jpg"),
            "http://a/500x500bb.jpg"
        );
        assert_eq!(upscale_artwork_url("http://a/cover.jpg"), "http://a/cover.jpg");
    }

    #[tokio::test]
    async fn test_fetch_downloads_upscaled_artwork() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| {
                r.url == "http://itunes.test/search?term=Queen%20A%20Night%20at%20the%20Opera&entity=album&limit=1"
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, SEARCH)));
        http.expect_execute()
            .withf(|r| r.url == "http://img.test/500x500bb.jpg")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, vec![1u8, 2, 3])));

        let mut terms = SearchTerms::new("Bohemian Rhapsody", "Queen");
        terms.album = Some("A Night at the Opera".to_string());
        let image = provider(http).fetch(&terms).await.unwrap();
        assert_eq!(image.len(), 3);
    }

    #[tokio::test]
    async fn test_falls_back_to_original_size() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| r.url.starts_with("http://itunes.test/"))
            .returning(|_| Ok(HttpResponse::new(200, SEARCH)));
        http.expect_execute()
            .withf(|r| r.url == "http://img.test/500x500bb.jpg")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));
        http.expect_execute()
            .withf(|r| r.url == "http://img.test/100x100bb.jpg")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, vec![9u8])));

        let image = provider(http)
            .fetch(&SearchTerms::new("Bohemian Rhapsody", "Queen"))
            .await
            .unwrap();
        assert_eq!(&image[..], &[9]);
    }

    #[tokio::test]
    async fn test_no_results_is_a_miss() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(200, r#"{"resultCount":0,"results":[]}"#)));

        let result = provider(http)
            .fetch(&SearchTerms::new("Bohemian Rhapsody", "Queen"))
            .await;
        assert!(matches!(result, Err(ProviderError::Miss(_))));
    }

    #[tokio::test]
    async fn test_blank_terms_skip_network() {
        let result = provider(no_network())
            .fetch(&SearchTerms::new("", ""))
            .await;
        assert!(matches!(result, Err(ProviderError::Validation(_))));
    }
}
