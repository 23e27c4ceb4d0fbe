//! Integration tests for logging system

use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());

    // The global subscriber can only be installed once per process
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Failed to initialize logging"));

    tracing::info!(file = %strip_path("/music/song.mp3"), "logging works");
}

#[test]
fn test_token_never_logged_verbatim() {
    let token = "genius-bearer-value";
    assert_eq!(redact_if_sensitive("genius_api_token", token), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", token), "[REDACTED]");
    assert_eq!(redact_if_sensitive("artist", "Queen"), "Queen");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("D:\\data\\file.mp3"), "file.mp3");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_default_format_is_compact() {
    let config = LoggingConfig::default();
    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Info);
    assert!(config.filter.is_none());
}
