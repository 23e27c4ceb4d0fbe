//! AZLyrics provider
//!
//! Song pages live at a predictable URL built from artist and title slugs.
//! The lyrics sit between the site's licensing comment and the next `</div>`.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::CoreConfig;
use std::sync::Arc;
use std::time::Duration;

use super::{execute, require, BROWSER_USER_AGENT};
use crate::error::ProviderError;
use crate::provider::ContentProvider;
use crate::query::SearchTerms;
use crate::text::{clean_html_lyrics, is_plausible_lyrics};

const AZLYRICS_BASE: &str = "https://www.azlyrics.com";

const START_MARKER: &str = "<!-- Usage of azlyrics.com content";

const MIN_LYRICS_CHARS: usize = 20;

pub struct AzLyricsProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl AzLyricsProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            base_url: AZLYRICS_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `"The Beatles"` → `"beatles"`, `"Don't Stop Me Now"` → `"dontstopmenow"`
pub(crate) fn slug(s: &str) -> String {
    let lower = s.to_lowercase();
    let lower = lower.strip_prefix("the ").unwrap_or(&lower);
    lower
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Text between the licensing comment and the closing `</div>`
pub(crate) fn extract_lyrics(html: &str) -> Option<String> {
    let start = html.find(START_MARKER)?;
    let comment_end = html[start..].find("-->")?;
    let lyrics_start = start + comment_end + "-->".len();
    let lyrics_len = html[lyrics_start..].find("</div>")?;

    let lyrics = clean_html_lyrics(&html[lyrics_start..lyrics_start + lyrics_len]);
    if is_plausible_lyrics(&lyrics, MIN_LYRICS_CHARS) {
        Some(lyrics)
    } else {
        None
    }
}

#[async_trait]
impl ContentProvider for AzLyricsProvider {
    type Content = String;

    fn source(&self) -> &'static str {
        "azlyrics"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<String, ProviderError> {
        let artist = slug(require(&terms.artist, "artist")?);
        let title = slug(require(&terms.title, "title")?);
        if artist.is_empty() || title.is_empty() {
            return Err(ProviderError::Validation(
                "artist and title need at least one letter or digit".to_string(),
            ));
        }

        let url = format!("{}/lyrics/{}/{}.html", self.base_url, artist, title);
        let request = HttpRequest::get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .timeout(self.timeout);

        let page = execute(self.http_client.as_ref(), request, self.source()).await?;
        extract_lyrics(&page.text_lossy())
            .ok_or_else(|| ProviderError::Miss("no lyrics block on azlyrics page".to_string()))
    }
}
