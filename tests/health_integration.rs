//! Integration tests for health polling.

mod support;

use std::time::Duration;

use clipfetch_core::{HealthMonitor, HealthStatus, SharedHealth};
use serde_json::json;
use support::api_client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn unhealthy_body() -> serde_json::Value {
    json!({
        "cookieStatus": {"valid": false, "message": "Cookies expired"},
        "diskSpace": {"sufficient": false, "message": "Only 200 MB free"}
    })
}

#[tokio::test]
async fn test_refresh_publishes_warnings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unhealthy_body()))
        .mount(&server)
        .await;

    let shared = SharedHealth::new();
    let monitor = HealthMonitor::new(api_client(&server), shared.clone());
    let status = monitor.refresh().await;

    let expected = HealthStatus {
        credential_warning: Some("Cookies expired".to_string()),
        disk_space_warning: Some("Only 200 MB free".to_string()),
    };
    assert_eq!(status, expected);
    assert_eq!(shared.snapshot(), expected);
}

#[tokio::test]
async fn test_failed_poll_keeps_last_known_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unhealthy_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let shared = SharedHealth::new();
    let monitor = HealthMonitor::new(api_client(&server), shared.clone());
    let first = monitor.refresh().await;
    let second = monitor.refresh().await;

    assert!(first.has_warnings());
    assert_eq!(second, first, "a failed poll must not clear warnings");
    assert_eq!(shared.snapshot(), first);
}

#[tokio::test]
async fn test_recovered_service_clears_warnings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unhealthy_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cookieStatus": {"valid": true},
            "diskSpace": {"sufficient": true}
        })))
        .mount(&server)
        .await;

    let shared = SharedHealth::new();
    let monitor = HealthMonitor::new(api_client(&server), shared.clone());
    assert!(monitor.refresh().await.has_warnings());
    assert!(!monitor.refresh().await.has_warnings());
    assert_eq!(shared.snapshot(), HealthStatus::default());
}

#[tokio::test]
async fn test_periodic_polling_until_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unhealthy_body()))
        .mount(&server)
        .await;

    let shared = SharedHealth::new();
    let mut task =
        HealthMonitor::new(api_client(&server), shared.clone()).start(Duration::from_millis(50));
    assert!(task.is_running());

    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let count = server.received_requests().await.map_or(0, |requests| requests.len());
            if count >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "expected at least two polls");
    assert!(shared.snapshot().has_warnings());

    task.stop();
    tokio::task::yield_now().await;
    assert!(!task.is_running());
}

#[tokio::test]
async fn test_zero_interval_still_polls_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unhealthy_body()))
        .mount(&server)
        .await;

    let shared = SharedHealth::new();
    let mut task = HealthMonitor::new(api_client(&server), shared.clone()).start(Duration::ZERO);

    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !shared.snapshot().has_warnings() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "the first poll runs immediately");
    assert!(task.is_running());
    task.stop();
}
