//! # Match Confidence Scoring
//!
//! Picks the best of several search hits returned by one provider.

use crate::query::normalize_for_search;
use std::collections::HashSet;

/// Weight of the title in the combined score; the artist gets the rest
pub const TITLE_WEIGHT: f64 = 0.7;

/// Minimum combined score for a candidate to be accepted
pub const ACCEPT_THRESHOLD: f64 = 0.4;

/// A scored search hit
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub title: String,
    pub artist: String,
    pub reference_url: String,
    pub title_score: f64,
    pub artist_score: f64,
}

impl CandidateMatch {
    pub fn combined_score(&self) -> f64 {
        TITLE_WEIGHT * self.title_score + (1.0 - TITLE_WEIGHT) * self.artist_score
    }
}

/// Similarity of two strings in `[0.0, 1.0]`
///
/// Exact match scores 1.0. If one contains the other (case-insensitive) the
/// score is the length ratio. Otherwise it is the share of distinct
/// whitespace-separated words the two have in common.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        let (la, lb) = (a.chars().count(), b.chars().count());
        let longer = la.max(lb);
        if longer == 0 {
            return 1.0;
        }
        return la.min(lb) as f64 / longer as f64;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let common = words_a.intersection(&words_b).count();
    common as f64 / words_a.len().max(words_b.len()) as f64
}

/// Score one hit against the wanted title and artist
pub fn score_candidate(
    wanted_title: &str,
    wanted_artist: &str,
    title: &str,
    artist: &str,
    reference_url: &str,
) -> CandidateMatch {
    CandidateMatch {
        title: title.to_string(),
        artist: artist.to_string(),
        reference_url: reference_url.to_string(),
        title_score: similarity(
            &normalize_for_search(wanted_title),
            &normalize_for_search(title),
        ),
        artist_score: similarity(
            &normalize_for_search(wanted_artist),
            &normalize_for_search(artist),
        ),
    }
}

/// Best candidate above [`ACCEPT_THRESHOLD`]; earlier candidates win ties
pub fn best_match<I>(candidates: I) -> Option<CandidateMatch>
where
    I: IntoIterator<Item = CandidateMatch>,
{
    let mut best: Option<(f64, CandidateMatch)> = None;
    for candidate in candidates {
        let score = candidate.combined_score();
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
            best = Some((score, candidate));
        }
    }

    best.filter(|(score, _)| *score > ACCEPT_THRESHOLD)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, artist: &str, url: &str) -> CandidateMatch {
        score_candidate("Hey Jude", "The Beatles", title, artist, url)
    }

    #[test]
    fn test_similarity_identity() {
        for s in ["", "hey jude", "Hey Jude", "ÄÖÜ"] {
            assert_eq!(similarity(s, s), 1.0);
        }
        assert_eq!(similarity("HEY JUDE", "hey jude"), 1.0);
    }

    #[test]
    fn test_similarity_substring_ratio() {
        assert_eq!(similarity("hey", "hey jude"), 3.0 / 8.0);
        assert_eq!(similarity("hey jude", "hey"), 3.0 / 8.0);
    }

    #[test]
    fn test_similarity_token_overlap() {
        let score = similarity("let it be", "let it go");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(similarity("let it go", "let it be"), score);
        assert_eq!(similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn test_similarity_token_overlap_ignores_duplicates() {
        let score = similarity("la la la love", "love la song");
        // distinct {la, love} vs {love, la, song}
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_match_picks_highest_combined() {
        let best = best_match(vec![
            hit("Hey Jude (Live)", "Beatles Tribute Band", "a"),
            hit("Hey Jude", "The Beatles", "b"),
            hit("Hey Jude", "Wilson Pickett", "c"),
        ])
        .unwrap();
        assert_eq!(best.reference_url, "b");
        assert!((best.combined_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let best = best_match(vec![
            hit("Hey Jude", "The Beatles", "first"),
            hit("Hey Jude", "The Beatles", "second"),
        ])
        .unwrap();
        assert_eq!(best.reference_url, "first");
    }

    #[test]
    fn test_best_match_rejects_weak_candidates() {
        assert!(best_match(vec![hit("Something Else", "Someone", "x")]).is_none());
        assert!(best_match(Vec::new()).is_none());
    }
}
