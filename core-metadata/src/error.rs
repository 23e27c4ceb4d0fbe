use thiserror::Error;

/// Failure of a single provider attempt
///
/// These never leave the resolution engine; they are logged and the next
/// provider or variant is tried.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required search term is missing. No I/O was attempted.
    #[error("Invalid query: {0}")]
    Validation(String),

    /// The provider answered but had nothing usable
    #[error("No result: {0}")]
    Miss(String),

    #[error("HTTP {status} from {provider}")]
    Http { provider: &'static str, status: u16 },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Parse(String),

    /// The provider task panicked or was aborted
    #[error("Provider fault: {0}")]
    Fault(String),
}

impl From<bridge_traits::error::BridgeError> for ProviderError {
    fn from(err: bridge_traits::error::BridgeError) -> Self {
        use bridge_traits::error::BridgeError;
        match err {
            BridgeError::Timeout(msg) => ProviderError::Timeout(msg),
            BridgeError::InvalidInput(msg) => ProviderError::Validation(msg),
            other => ProviderError::Network(other.to_string()),
        }
    }
}

/// Kind of content being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Lyrics,
    Artwork,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Lyrics => f.write_str("lyrics"),
            ContentKind::Artwork => f.write_str("artwork"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Query has no usable search terms
    #[error("Invalid query: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Every variant and provider was exhausted
    #[error("No {0} found")]
    NotFound(ContentKind),

    /// Reading or writing tags of one file failed
    #[error("Tag store error: {0}")]
    TagStore(String),

    /// Fatal pre-flight problem (bad directory or pattern)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task panicked while processing a file
    #[error("Task fault: {0}")]
    TaskFault(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_bridge_errors_map_to_provider_errors() {
        assert!(matches!(
            ProviderError::from(BridgeError::Timeout("slow".into())),
            ProviderError::Timeout(_)
        ));
        assert!(matches!(
            ProviderError::from(BridgeError::OperationFailed("reset".into())),
            ProviderError::Network(_)
        ));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            MetadataError::NotFound(ContentKind::Lyrics).to_string(),
            "No lyrics found"
        );
        assert_eq!(
            MetadataError::NotFound(ContentKind::Artwork).to_string(),
            "No artwork found"
        );
    }
}
