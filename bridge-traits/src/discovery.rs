//! File Discovery Abstraction

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Default file-name pattern for discovery
pub const DEFAULT_PATTERN: &str = "*.mp3";

/// What to look for and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    /// Directory to search
    pub root: PathBuf,
    /// Glob matched against the file name (`*`, `?`, `[...]`)
    pub pattern: String,
    /// Descend into subdirectories
    pub recursive: bool,
}

impl DiscoveryRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// File walker trait
///
/// Implementations return matching regular files in a stable (sorted) order
/// and report a malformed pattern as [`BridgeError::InvalidInput`].
///
/// [`BridgeError::InvalidInput`]: crate::error::BridgeError::InvalidInput
#[async_trait]
pub trait FileWalker: Send + Sync {
    /// Validate `pattern` without touching the filesystem
    fn check_pattern(&self, pattern: &str) -> Result<()>;

    /// Enumerate files matching `request`
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_request_defaults() {
        let request = DiscoveryRequest::new("/music");
        assert_eq!(request.root, PathBuf::from("/music"));
        assert_eq!(request.pattern, "*.mp3");
        assert!(!request.recursive);

        let request = request.with_pattern("*.flac").with_recursive(true);
        assert_eq!(request.pattern, "*.flac");
        assert!(request.recursive);
    }
}
