//! Integration tests for the two-phase resolver.

mod support;

use clipfetch_core::catalog::{self, FormatAxis};
use clipfetch_core::error::ErrorKind;
use clipfetch_core::{FormatsState, InfoResolver, MediaReference, ResolveError};
use serde_json::json;
use support::{api_client, mount_youtube_lookup, youtube_formats};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_youtube_resolves_in_two_phases() {
    let server = MockServer::start().await;
    mount_youtube_lookup(&server, "Never Gonna Give You Up").await;

    let resolver = InfoResolver::new(api_client(&server));
    let media = resolver
        .resolve_input("  https://www.youtube.com/watch?v=dQw4w9WgXcQ  ")
        .await
        .unwrap();

    assert_eq!(media.metadata.title, "Never Gonna Give You Up");
    assert_eq!(media.metadata.view_count, Some(1_500_000));
    let list = media.formats.list().expect("formats loaded");
    assert_eq!(list.len(), 3);

    let video = catalog::filter(&list.formats, FormatAxis::Video);
    assert_eq!(video.len(), 2);
    assert_eq!(
        catalog::default_selection(&list.formats, FormatAxis::Audio).map(|f| f.format_id),
        Some("140".to_string())
    );
}

#[tokio::test]
async fn test_metadata_phase_leaves_formats_pending() {
    let server = MockServer::start().await;
    mount_youtube_lookup(&server, "Clip").await;

    let resolver = InfoResolver::new(api_client(&server));
    let reference = MediaReference::parse("https://youtu.be/abc").unwrap();
    let media = resolver.fetch_metadata(&reference).await.unwrap();

    assert!(media.formats.is_pending());
    assert_eq!(media.reference, reference);
}

#[tokio::test]
async fn test_single_call_platform_is_loaded_after_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facebook/video-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Reel",
            "author": "Page",
            "formats": [
                {"formatId": "hd", "quality": "720p", "ext": "mp4", "hasVideo": true, "hasAudio": true},
                {"formatId": "sd", "quality": "360p", "ext": "mp4", "hasVideo": true, "hasAudio": true}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = InfoResolver::new(api_client(&server));
    let media = resolver
        .resolve_input("https://www.facebook.com/reel/123")
        .await
        .unwrap();

    match &media.formats {
        FormatsState::Loaded(list) => {
            assert_eq!(list.len(), 2);
            assert_eq!(list.formats[0].container, "mp4");
        }
        other => panic!("expected loaded formats, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_call_formats_without_track_flags_are_selectable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facebook/video-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Reel",
            "formats": [
                {"formatId": "hd", "quality": "HD", "ext": "mp4"},
                {"formatId": "sd", "quality": "SD", "ext": "mp4"}
            ]
        })))
        .mount(&server)
        .await;

    let resolver = InfoResolver::new(api_client(&server));
    let media = resolver
        .resolve_input("https://www.facebook.com/reel/123")
        .await
        .unwrap();
    let list = media.formats.list().expect("formats loaded");

    let video = catalog::filter(&list.formats, FormatAxis::Video);
    assert_eq!(video.len(), 2);
    assert_eq!(
        catalog::default_selection(&list.formats, FormatAxis::Video).map(|f| f.format_id),
        Some("hd".to_string())
    );
}

#[tokio::test]
async fn test_format_failure_keeps_metadata_and_retry_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video-metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Clip"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/video-formats"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "formats timed out"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/video-formats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(youtube_formats()))
        .mount(&server)
        .await;

    let resolver = InfoResolver::new(api_client(&server));
    let mut media = resolver.resolve_input("https://youtu.be/abc").await.unwrap();

    assert_eq!(media.metadata.title, "Clip");
    assert_eq!(
        media.formats,
        FormatsState::Failed("formats timed out".to_string())
    );

    resolver.load_formats(&mut media).await.unwrap();
    assert_eq!(media.metadata.title, "Clip");
    assert_eq!(media.formats.list().map(|list| list.len()), Some(3));
}

#[tokio::test]
async fn test_metadata_not_found_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/video-metadata"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Private video"})))
        .mount(&server)
        .await;

    let resolver = InfoResolver::new(api_client(&server));
    let err = resolver.resolve_input("https://youtu.be/abc").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.user_message(), "Private video");
}

#[tokio::test]
async fn test_invalid_input_never_reaches_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = InfoResolver::new(api_client(&server));
    for input in ["", "   ", "https://example.com/video.mp4"] {
        let err = resolver.resolve_input(input).await.unwrap_err();
        assert!(matches!(err, ResolveError::Validation(_)), "{input:?}");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
