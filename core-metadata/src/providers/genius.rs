//! Genius lyrics provider
//!
//! Searches `api.genius.com`, picks the best-scoring hit, then scrapes the
//! lyrics from the song page. Works without a token at a lower rate limit.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::CoreConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{execute, parse_json, require, BROWSER_USER_AGENT};
use crate::error::ProviderError;
use crate::matching::{best_match, score_candidate};
use crate::provider::ContentProvider;
use crate::query::SearchTerms;
use crate::text::{clean_html_lyrics, is_plausible_lyrics};

const GENIUS_API_BASE: &str = "https://api.genius.com";

/// Scraped text must be longer than this to count
const MIN_LYRICS_CHARS: usize = 51;

/// Lyric containers, most specific first
static LYRICS_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?s)<div[^>]*data-lyrics-container="true"[^>]*>(.*?)</div>"#,
        r#"(?s)<div[^>]*class="[^"]*lyrics[^"]*"[^>]*>(.*?)</div>"#,
        r#"(?s)<div[^>]*id="lyrics-root"[^>]*>(.*?)</div>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Deserialize)]
struct SearchResponse {
    meta: Option<Meta>,
    #[serde(default)]
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct Meta {
    status: u16,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    result: HitResult,
}

#[derive(Debug, Deserialize)]
struct HitResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    primary_artist: Option<PrimaryArtist>,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct PrimaryArtist {
    #[serde(default)]
    name: String,
}

pub struct GeniusProvider {
    http_client: Arc<dyn HttpClient>,
    api_token: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GeniusProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            api_token: config.genius_api_token.clone(),
            base_url: GENIUS_API_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .timeout(self.timeout)
    }

    async fn search(&self, title: &str, artist: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&format!("{} {}", artist, title))
        );

        let mut request = self.request(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_token(token.as_str());
        }

        let response = execute(self.http_client.as_ref(), request, self.source()).await?;
        let search: SearchResponse = parse_json(&response, self.source())?;

        if let Some(meta) = search.meta {
            if meta.status != 200 {
                return Err(ProviderError::Miss(format!(
                    "genius API status {}: {}",
                    meta.status,
                    meta.message.unwrap_or_default()
                )));
            }
        }

        if search.response.hits.is_empty() {
            return Err(ProviderError::Miss("no genius hits".to_string()));
        }

        let candidates = search.response.hits.iter().map(|hit| {
            let artist_name = hit
                .result
                .primary_artist
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or("");
            score_candidate(title, artist, &hit.result.title, artist_name, &hit.result.url)
        });

        let best = best_match(candidates)
            .ok_or_else(|| ProviderError::Miss("no confident genius match".to_string()))?;
        debug!(
            title = %best.title,
            artist = %best.artist,
            score = best.combined_score(),
            "Genius match"
        );
        Ok(best.reference_url)
    }
}

/// Pull lyrics out of a Genius song page
pub(crate) fn extract_lyrics(html: &str) -> Option<String> {
    for pattern in LYRICS_BLOCKS.iter() {
        let mut raw = String::new();
        for captures in pattern.captures_iter(html) {
            if let Some(block) = captures.get(1) {
                raw.push_str(block.as_str());
                raw.push('\n');
            }
        }

        if raw.is_empty() {
            continue;
        }

        let lyrics = clean_html_lyrics(&raw);
        if is_plausible_lyrics(&lyrics, MIN_LYRICS_CHARS) {
            return Some(lyrics);
        }
    }
    None
}

#[async_trait]
impl ContentProvider for GeniusProvider {
    type Content = String;

    fn source(&self) -> &'static str {
        "genius"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<String, ProviderError> {
        let title = require(&terms.title, "title")?;
        let artist = require(&terms.artist, "artist")?;

        let page_url = self.search(title, artist).await?;
        if page_url.is_empty() {
            return Err(ProviderError::Miss("genius hit has no url".to_string()));
        }

        let page = execute(
            self.http_client.as_ref(),
            self.request(&page_url),
            self.source(),
        )
        .await?;

        extract_lyrics(&page.text_lossy())
            .ok_or_else(|| ProviderError::Miss("no lyrics on genius page".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{no_network, MockHttp};
    use bridge_traits::http::HttpResponse;

    const VERSE: &str = "Hey Jude, don't make it bad<br/>Take a sad song and make it better<br/>Remember to let her into your heart";

    fn search_json() -> String {
        serde_json::json!({
            "meta": {"status": 200},
            "response": {"hits": [
                {"result": {"title": "Hey Jude (Live)", "primary_artist": {"name": "Someone Else"}, "url": "https://genius.com/wrong"}},
                {"result": {"title": "Hey Jude", "primary_artist": {"name": "The Beatles"}, "url": "https://genius.com/the-beatles-hey-jude-lyrics"}}
            ]}
        })
        .to_string()
    }

    fn provider(http: MockHttp, token: Option<&str>) -> GeniusProvider {
        let mut builder = CoreConfig::builder();
        if let Some(token) = token {
            builder = builder.genius_api_token(token);
        }
        let config = builder.build().unwrap();
        GeniusProvider::new(Arc::new(http), &config).with_base_url("http://genius.test")
    }

    #[tokio::test]
    async fn test_fetch_scrapes_best_hit() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| {
                r.url == "http://genius.test/search?q=The%20Beatles%20Hey%20Jude"
                    && r.headers.get("Authorization") == Some(&"Bearer tok".to_string())
                    && r.timeout == Some(Duration::from_secs(15))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, search_json())));
        http.expect_execute()
            .withf(|r| r.url == "https://genius.com/the-beatles-hey-jude-lyrics")
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    format!(
                        r#"<html><div data-lyrics-container="true" class="x">{}</div></html>"#,
                        VERSE
                    ),
                ))
            });

        let lyrics = provider(http, Some("tok"))
            .fetch(&SearchTerms::new("Hey Jude", "The Beatles"))
            .await
            .unwrap();

        assert!(lyrics.starts_with("Hey Jude, don't make it bad\n"));
        assert_eq!(lyrics.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| r.url.starts_with("http://genius.test/search"))
            .times(1)
            .returning(|r| {
                assert!(!r.headers.contains_key("Authorization"));
                Ok(HttpResponse::new(401, r#"{"meta":{"status":401}}"#))
            });

        let result = provider(http, None)
            .fetch(&SearchTerms::new("Hey Jude", "The Beatles"))
            .await;
        assert!(matches!(result, Err(ProviderError::Http { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_weak_hits_are_a_miss() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"meta":{"status":200},"response":{"hits":[{"result":{"title":"Other","primary_artist":{"name":"Nobody"},"url":"u"}}]}}"#,
            ))
        });

        let result = provider(http, None)
            .fetch(&SearchTerms::new("Hey Jude", "The Beatles"))
            .await;
        assert!(matches!(result, Err(ProviderError::Miss(_))));
    }

    #[tokio::test]
    async fn test_missing_terms_skip_network() {
        let result = provider(no_network(), None)
            .fetch(&SearchTerms::new("Hey Jude", "  "))
            .await;
        assert!(matches!(result, Err(ProviderError::Validation(_))));
    }

    #[test]
    fn test_extract_lyrics_requires_enough_text() {
        assert!(extract_lyrics(r#"<div data-lyrics-container="true">la la</div>"#).is_none());
        assert!(extract_lyrics("<html>nothing</html>").is_none());

        let html = format!(r#"<div id="lyrics-root">{}</div>"#, VERSE);
        assert!(extract_lyrics(&html).is_some());
    }
}
