//! ChartLyrics provider (`SearchLyricDirect` XML endpoint)

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::CoreConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use super::{execute, require};
use crate::error::ProviderError;
use crate::provider::ContentProvider;
use crate::query::{normalize_for_search, SearchTerms};
use crate::text::{decode_entities, is_plausible_lyrics};

const CHARTLYRICS_BASE: &str = "http://api.chartlyrics.com/apiv1.asmx";

const MIN_LYRICS_CHARS: usize = 20;

/// Responses often run sentences together on one line
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s+([A-Z])").unwrap());

pub struct ChartLyricsProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl ChartLyricsProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            base_url: CHARTLYRICS_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Contents of the first `<Lyric>` element, matched case-insensitively
pub(crate) fn extract_lyric_element(xml: &str) -> Option<&str> {
    // ASCII lowering keeps byte offsets aligned with `xml`
    let lower = xml.to_ascii_lowercase();
    let open = lower.find("<lyric>")? + "<lyric>".len();
    let close = open + lower[open..].find("</lyric>")?;
    Some(&xml[open..close])
}

pub(crate) fn format_lyrics(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let split = SENTENCE_BREAK.replace_all(decoded.trim(), "${1}\n${2}");
    split
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[async_trait]
impl ContentProvider for ChartLyricsProvider {
    type Content = String;

    fn source(&self) -> &'static str {
        "chartlyrics"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<String, ProviderError> {
        let artist = normalize_for_search(&terms.artist);
        let title = normalize_for_search(&terms.title);
        let artist = require(&artist, "artist")?;
        let title = require(&title, "title")?;

        let url = format!(
            "{}/SearchLyricDirect?artist={}&song={}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );
        let request = HttpRequest::get(url).timeout(self.timeout);

        let response = execute(self.http_client.as_ref(), request, self.source()).await?;
        let xml = response.text_lossy();

        let raw = extract_lyric_element(&xml)
            .ok_or_else(|| ProviderError::Miss("no <Lyric> element".to_string()))?;
        let lyrics = format_lyrics(raw);
        if !is_plausible_lyrics(&lyrics, MIN_LYRICS_CHARS) {
            return Err(ProviderError::Miss(format!(
                "chartlyrics returned {} chars, too short for lyrics",
                lyrics.chars().count()
            )));
        }
        Ok(lyrics)
    }
}
