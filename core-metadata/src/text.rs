//! HTML-to-text cleanup for scraped lyrics

use once_cell::sync::Lazy;
use regex::Regex;

static BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?(div|p)[^>]*>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static BOILERPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s*(Contributor|Translation|Embed|Share)").unwrap());
static CONTRIBUTORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*Contributors?$").unwrap());

/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&amp;", "&"),
];

/// Decode the handful of HTML entities lyric pages actually use
pub fn decode_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

/// Convert a lyrics HTML fragment to plain text, one lyric line per line
///
/// Line breaks and block tags become newlines, other tags are dropped,
/// entities are decoded, and blank or "N Contributors"/"Embed" style lines
/// are removed.
pub fn clean_html_lyrics(html: &str) -> String {
    let text = BREAK_TAG.replace_all(html, "\n");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !BOILERPLATE.is_match(line) && !CONTRIBUTORS.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether cleaned text is long enough to be real lyrics
pub fn is_plausible_lyrics(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_lyrics() {
        let html = r#"<div data-lyrics-container="true">[Verse 1]<br/>Hey Jude, don&#39;t make it bad<br>
            <a href="/x"><span>Take a sad song</span></a> &amp; make it better</div>"#;

        assert_eq!(
            clean_html_lyrics(html),
            "[Verse 1]\nHey Jude, don't make it bad\nTake a sad song & make it better"
        );
    }

    #[test]
    fn test_clean_html_drops_boilerplate() {
        let html = "<p>12 Contributors</p><p>3 Translations</p>Line one<BR />\n\n  Line two  <p>1Embed</p>";
        assert_eq!(clean_html_lyrics(html), "Line one\nLine two");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("&quot;Rock&#8217;n&apos; roll&quot; &lt;3 &amp;lt;"),
            "\"Rock'n' roll\" <3 &lt;"
        );
    }

    #[test]
    fn test_is_plausible_lyrics() {
        assert!(!is_plausible_lyrics("   short   ", 20));
        assert!(is_plausible_lyrics("twenty characters!!!", 20));
        assert!(!is_plausible_lyrics("", 1));
    }
}
