//! Integration tests for the core service façade

use async_trait::async_trait;
use bridge_traits::discovery::{DiscoveryRequest, FileWalker};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::tags::{TagStore, TagUpdates, TrackTags};
use core_metadata::{BatchOptions, MetadataError, NoProgress};
use core_runtime::config::CoreConfig;
use core_service::{CoreDependencies, CoreError, CoreService};
use mockall::mock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mock! {
    pub Tags {}

    #[async_trait]
    impl TagStore for Tags {
        async fn read_tags(&self, path: &Path) -> BridgeResult<TrackTags>;
        async fn edit_tags(&self, path: &Path, updates: &TagUpdates) -> BridgeResult<()>;
    }
}

mock! {
    pub Walker {}

    #[async_trait]
    impl FileWalker for Walker {
        fn check_pattern(&self, pattern: &str) -> BridgeResult<()>;
        async fn discover(&self, request: &DiscoveryRequest) -> BridgeResult<Vec<PathBuf>>;
    }
}

fn tagged(title: &str) -> TrackTags {
    TrackTags {
        title: Some(title.to_string()),
        artist: Some("The Beatles".to_string()),
        ..Default::default()
    }
}

/// Every provider request is answered with a 404
fn offline_http() -> MockHttp {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Ok(HttpResponse::new(404, "")));
    http
}

fn service(http: MockHttp, tags: MockTags, files: Vec<PathBuf>) -> CoreService {
    let mut walker = MockWalker::new();
    walker.expect_check_pattern().returning(|_| Ok(()));
    walker
        .expect_discover()
        .returning(move |_| Ok(files.clone()));

    let config = CoreConfig::builder()
        .artwork_cache_capacity(16)
        .build()
        .unwrap();
    CoreService::new(
        config,
        CoreDependencies::new(Arc::new(http), Arc::new(tags), Arc::new(walker)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = CoreConfig::default();
    config.batch_workers = 0;

    let result = CoreService::new(
        config,
        CoreDependencies::new(
            Arc::new(MockHttp::new()),
            Arc::new(MockTags::new()),
            Arc::new(MockWalker::new()),
        ),
    );
    assert!(matches!(result, Err(CoreError::Runtime(_))));
}

#[tokio::test]
async fn test_batch_with_no_provider_answers_counts_errors() {
    let dir = TempDir::new().unwrap();
    let files = vec![dir.path().join("a.mp3"), dir.path().join("b.mp3")];

    let mut tags = MockTags::new();
    tags.expect_read_tags()
        .times(2)
        .returning(|_| Ok(tagged("Hey Jude")));
    tags.expect_edit_tags().never();

    let core = service(offline_http(), tags, files);
    let summary = core
        .run_batch(
            &DiscoveryRequest::new(dir.path()),
            &BatchOptions::default().with_workers(2),
            Arc::new(NoProgress),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(core.artwork_cache().len().await, 0);
}

#[tokio::test]
async fn test_missing_directory_surfaces_as_metadata_config_error() {
    let core = service(MockHttp::new(), MockTags::new(), Vec::new());

    let result = core
        .run_batch(
            &DiscoveryRequest::new("/no/such/music/dir"),
            &BatchOptions::default(),
            Arc::new(NoProgress),
            CancellationToken::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(CoreError::Metadata(MetadataError::Config(_)))
    ));
}

#[tokio::test]
async fn test_fetch_file_writes_lyrics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hey-jude.mp3");
    std::fs::write(&path, b"fake").unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|r| r.url.starts_with("https://api.lyrics.ovh/"))
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"lyrics":"Hey Jude, don't make it bad"}"#,
            ))
        });
    http.expect_execute()
        .withf(|r| !r.url.starts_with("https://api.lyrics.ovh/"))
        .returning(|_| Ok(HttpResponse::new(404, "")));

    let mut tags = MockTags::new();
    tags.expect_read_tags()
        .times(1)
        .returning(|_| Ok(tagged("Hey Jude")));
    tags.expect_edit_tags()
        .withf(|_, updates| {
            updates.lyrics.as_deref() == Some("Hey Jude, don't make it bad")
                && updates.artwork.is_none()
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let core = service(http, tags, Vec::new());
    let result = core
        .fetch_file(&path, &BatchOptions::default().with_artwork(false))
        .await
        .unwrap();

    assert!(result.succeeded);
    assert!(result.updated);
}

#[tokio::test]
async fn test_fetch_file_requires_an_existing_file() {
    let core = service(MockHttp::new(), MockTags::new(), Vec::new());
    let result = core
        .fetch_file(Path::new("/no/such/file.mp3"), &BatchOptions::default())
        .await;
    assert!(matches!(result, Err(CoreError::Metadata(_))));
}
