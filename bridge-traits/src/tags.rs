//! Tag Store Abstraction
//!
//! Reads and writes the handful of tag fields the resolution core cares
//! about. Binary tag formats and image re-encoding stay behind this trait.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Tag fields read from an audio file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Unsynchronised lyrics text
    pub lyrics: Option<String>,
    /// Front cover image bytes
    pub artwork: Option<Bytes>,
}

impl TrackTags {
    /// Whether the file already carries non-blank lyrics
    pub fn has_lyrics(&self) -> bool {
        self.lyrics
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
    }

    /// Whether the file already carries a non-empty picture
    pub fn has_artwork(&self) -> bool {
        self.artwork.as_ref().map(|a| !a.is_empty()).unwrap_or(false)
    }
}

/// Fields to write back. `None` leaves the existing value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdates {
    pub lyrics: Option<String>,
    pub artwork: Option<Bytes>,
    /// Remove existing lyrics (ignored when `lyrics` is set)
    pub clear_lyrics: bool,
    /// Remove existing artwork (ignored when `artwork` is set)
    pub clear_artwork: bool,
}

impl TagUpdates {
    /// True when applying these updates would not change the file
    pub fn is_empty(&self) -> bool {
        self.lyrics.is_none() && self.artwork.is_none() && !self.clear_lyrics && !self.clear_artwork
    }
}

/// Tag persistence trait
///
/// Errors are scoped to a single file; callers treat them as a per-file
/// failure and keep going.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Read the current tags of `path`
    async fn read_tags(&self, path: &Path) -> Result<TrackTags>;

    /// Apply `updates` to `path`
    async fn edit_tags(&self, path: &Path, updates: &TagUpdates) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_tags_presence() {
        let mut tags = TrackTags::default();
        assert!(!tags.has_lyrics());
        assert!(!tags.has_artwork());

        tags.lyrics = Some("   \n".to_string());
        tags.artwork = Some(Bytes::new());
        assert!(!tags.has_lyrics());
        assert!(!tags.has_artwork());

        tags.lyrics = Some("Hey Jude, don't make it bad".to_string());
        tags.artwork = Some(Bytes::from_static(&[0xFF, 0xD8, 0xFF]));
        assert!(tags.has_lyrics());
        assert!(tags.has_artwork());
    }

    #[test]
    fn test_tag_updates_is_empty() {
        assert!(TagUpdates::default().is_empty());
        assert!(!TagUpdates {
            lyrics: Some("text".to_string()),
            ..Default::default()
        }
        .is_empty());
        assert!(!TagUpdates {
            clear_artwork: true,
            ..Default::default()
        }
        .is_empty());
    }
}
