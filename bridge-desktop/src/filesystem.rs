//! File Discovery Implementation using Walkdir

use async_trait::async_trait;
use bridge_traits::{
    discovery::{DiscoveryRequest, FileWalker},
    error::{BridgeError, Result},
};
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Shell-style file-name pattern compiled to a regex
///
/// Supports `*` (any run of characters except `/`), `?` (one character) and
/// bracket classes such as `[0-9]` or `[!abc]`. Everything else matches
/// literally. The whole file name must match.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    regex: Regex,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(BridgeError::InvalidInput("empty file pattern".to_string()));
        }

        let translated = translate(pattern)?;
        let regex = Regex::new(&translated).map_err(|e| {
            BridgeError::InvalidInput(format!("invalid file pattern '{}': {}", pattern, e))
        })?;

        Ok(Self { regex })
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

fn translate(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    if inner == '\\' || inner == '[' {
                        class.push('\\');
                    }
                    class.push(inner);
                }
                if !closed || class.is_empty() || class == "^" {
                    return Err(BridgeError::InvalidInput(format!(
                        "invalid file pattern '{}': unterminated character class",
                        pattern
                    )));
                }
                out.push('[');
                out.push_str(&class);
                out.push(']');
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }

    out.push('$');
    Ok(out)
}

/// Walkdir-based file walker
///
/// Non-recursive requests only look at the direct children of the root.
/// Unreadable entries below the root are logged and skipped.
#[derive(Debug, Default, Clone)]
pub struct WalkdirFileWalker;

impl WalkdirFileWalker {
    pub fn new() -> Self {
        Self
    }

    fn walk(request: &DiscoveryRequest, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
        if !request.root.is_dir() {
            return Err(BridgeError::InvalidInput(format!(
                "not a directory: {}",
                request.root.display()
            )));
        }

        let mut walker = WalkDir::new(&request.root).follow_links(true);
        if !request.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .file_name()
                .to_str()
                .map(|name| matcher.is_match(name))
                .unwrap_or(false);
            if matches {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl FileWalker for WalkdirFileWalker {
    fn check_pattern(&self, pattern: &str) -> Result<()> {
        GlobMatcher::new(pattern).map(|_| ())
    }

    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<PathBuf>> {
        let matcher = GlobMatcher::new(&request.pattern)?;
        let request = request.clone();

        let files = tokio::task::spawn_blocking(move || Self::walk(&request, &matcher))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("discovery task failed: {}", e)))??;

        debug!(count = files.len(), "Discovered files");
        Ok(files)
    }
}
