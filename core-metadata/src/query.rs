//! # Query Normalisation
//!
//! Turns a raw title/artist pair into an ordered list of search variants.
//! The first variant is always the input verbatim; later variants are
//! progressively looser rewrites used when the exact phrasing finds nothing.
//!
//! Everything here is pure text manipulation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Caller-supplied search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

impl Query {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        let album = album.into();
        self.album = if album.trim().is_empty() {
            None
        } else {
            Some(album)
        };
        self
    }

    /// True when there is nothing to search for
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.artist.trim().is_empty()
            && self
                .album
                .as_deref()
                .map(|a| a.trim().is_empty())
                .unwrap_or(true)
    }
}

/// Which rewrite produced a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Identity,
    Normalized,
    FeaturingStripped,
    NormalizedFeaturingStripped,
    Swapped,
}

/// One phrasing of the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchVariant {
    pub kind: VariantKind,
    pub title: String,
    pub artist: String,
}

impl SearchVariant {
    fn same_terms(&self, title: &str, artist: &str) -> bool {
        self.title == title && self.artist == artist
    }
}

/// What a provider receives for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

impl SearchTerms {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    pub fn from_variant(variant: &SearchVariant, album: Option<&str>) -> Self {
        Self {
            title: variant.title.clone(),
            artist: variant.artist.clone(),
            album: album.map(str::to_string),
        }
    }

    pub fn album_or_empty(&self) -> &str {
        self.album.as_deref().unwrap_or("")
    }
}

static QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"‘’“”„«»]"#).unwrap());
static TRAILING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static FEAT_BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[\[(].*?(feat|ft|featuring).*?[\])]").unwrap());
static FEAT_DASHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[-–—]\s*(feat|ft|featuring).*$").unwrap());
static FEAT_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(feat|ft|featuring)\.?\s+.*$").unwrap());
static FEAT_LISTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[,&]\s*(feat|ft|featuring).*$").unwrap());

static TRACK_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9]{1,3}[-_. ]+").unwrap());

/// Lower-case, strip quotes and one trailing `.`/`!`/`?`, collapse whitespace
pub fn normalize_for_search(s: &str) -> String {
    let s = s.to_lowercase();
    let s = QUOTES.replace_all(s.trim(), "");
    let s = TRAILING_PUNCT.replace(&s, "");
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

/// Drop `(feat. X)`, `- feat. X` and trailing `feat. X` clauses from a title
pub fn remove_featuring(title: &str) -> String {
    let s = FEAT_BRACKETED.replace_all(title, "");
    let s = FEAT_DASHED.replace_all(&s, "");
    let s = FEAT_TRAILING.replace_all(&s, "");
    s.trim().to_string()
}

/// Reduce an artist credit to the primary artist
///
/// Featuring clauses are removed, then anything from the first `&` on.
pub fn main_artist(artist: &str) -> String {
    let s = FEAT_BRACKETED.replace_all(artist, "");
    let s = FEAT_LISTED.replace_all(&s, "");
    let s = FEAT_TRAILING.replace_all(&s, "");
    let primary = s.split('&').next().unwrap_or("");
    primary.trim().to_string()
}

/// Best-effort title for files without a title tag
///
/// `"03 - Hey_Jude.mp3"` becomes `"Hey Jude"`.
pub fn derive_title_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = TRACK_NUMBER_PREFIX.replace(&stem, "");
    let spaced = stem.replace(['_', '-'], " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordered, de-duplicated search variants for a title/artist pair
///
/// Never empty; the first entry is the input unchanged.
pub fn generate_variants(title: &str, artist: &str) -> Vec<SearchVariant> {
    let mut variants: Vec<SearchVariant> = Vec::with_capacity(5);
    let mut push = |kind: VariantKind, title: String, artist: String| {
        if !variants.iter().any(|v| v.same_terms(&title, &artist)) {
            variants.push(SearchVariant {
                kind,
                title,
                artist,
            });
        }
    };

    push(VariantKind::Identity, title.to_string(), artist.to_string());

    push(
        VariantKind::Normalized,
        normalize_for_search(title),
        normalize_for_search(artist),
    );

    let stripped_title = remove_featuring(title);
    let stripped_artist = main_artist(artist);
    let normalized_stripped = (
        normalize_for_search(&stripped_title),
        normalize_for_search(&stripped_artist),
    );
    push(
        VariantKind::FeaturingStripped,
        stripped_title,
        stripped_artist,
    );
    push(
        VariantKind::NormalizedFeaturingStripped,
        normalized_stripped.0,
        normalized_stripped.1,
    );

    push(VariantKind::Swapped, artist.to_string(), title.to_string());

    variants
}
