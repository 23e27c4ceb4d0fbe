//! Lyrics.ovh provider (`GET /v1/{artist}/{title}`)

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::CoreConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{execute, parse_json, require};
use crate::error::ProviderError;
use crate::provider::ContentProvider;
use crate::query::{normalize_for_search, SearchTerms};
use crate::text::is_plausible_lyrics;

const LYRICS_OVH_BASE: &str = "https://api.lyrics.ovh";

const MIN_LYRICS_CHARS: usize = 20;

#[derive(Debug, Deserialize)]
struct LyricsResponse {
    #[serde(default)]
    lyrics: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct LyricsOvhProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl LyricsOvhProvider {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self {
            http_client,
            base_url: LYRICS_OVH_BASE.to_string(),
            timeout: config.provider_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ContentProvider for LyricsOvhProvider {
    type Content = String;

    fn source(&self) -> &'static str {
        "lyrics.ovh"
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<String, ProviderError> {
        let artist = normalize_for_search(&terms.artist);
        let title = normalize_for_search(&terms.title);
        require(&artist, "artist")?;
        require(&title, "title")?;

        let url = format!(
            "{}/v1/{}/{}",
            self.base_url,
            urlencoding::encode(&artist),
            urlencoding::encode(&title)
        );
        let request = HttpRequest::get(url).timeout(self.timeout);

        let response = execute(self.http_client.as_ref(), request, self.source()).await?;
        let body: LyricsResponse = parse_json(&response, self.source())?;

        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            return Err(ProviderError::Miss(format!("lyrics.ovh: {}", error)));
        }

        let lyrics = body.lyrics.unwrap_or_default().trim().to_string();
        if !is_plausible_lyrics(&lyrics, MIN_LYRICS_CHARS) {
            return Err(ProviderError::Miss(format!(
                "lyrics.ovh returned {} chars, too short for lyrics",
                lyrics.chars().count()
            )));
        }
        Ok(lyrics)
    }
}
