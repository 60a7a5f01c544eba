//! Shared mock-service helpers for integration tests.
//!
//! Every helper mounts routes under `/api` on a wiremock server, mirroring
//! the extraction service layout.

#![allow(dead_code)]

use std::time::Duration;

use clipfetch_core::{ApiClient, HttpSettings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base URL of the mocked service.
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

pub fn api_client(server: &MockServer) -> ApiClient {
    ApiClient::new(&api_base(server), HttpSettings::default()).expect("mock base URL is valid")
}

/// Encodes JSON payloads as a `text/event-stream` body.
pub fn sse_body(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {event}\n\n"))
        .collect()
}

pub fn youtube_formats() -> Value {
    json!({
        "formats": [
            {"formatId": "137", "quality": "1080p", "container": "mp4", "hasVideo": true, "hasAudio": false, "filesize": 52_428_800},
            {"formatId": "22", "quality": "720p", "container": "mp4", "hasVideo": true, "hasAudio": true},
            {"formatId": "140", "quality": "AUDIO_QUALITY_MEDIUM", "container": "m4a", "hasVideo": false, "hasAudio": true, "audioBitrate": 128}
        ],
        "bestAudioItag": "140"
    })
}

/// Mounts the two YouTube lookup routes.
pub async fn mount_youtube_lookup(server: &MockServer, title: &str) {
    Mock::given(method("POST"))
        .and(path("/api/video-metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": title,
            "author": "Rick Astley",
            "duration": 213,
            "viewCount": "1500000"
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/video-formats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(youtube_formats()))
        .mount(server)
        .await;
}

/// Mounts job creation, a progress stream ending in `completed` and the
/// artifact route.
pub async fn mount_job(server: &MockServer, start_route: &str, job_id: &str, filename: &str, body: &[u8]) {
    Mock::given(method("POST"))
        .and(path(format!("/api{start_route}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloadId": job_id })))
        .mount(server)
        .await;
    mount_progress(
        server,
        job_id,
        &[
            json!({"status": "downloading", "progress": 40, "stage": "Downloading..."}),
            json!({"status": "processing", "progress": 90}),
            json!({"status": "completed", "progress": 100, "filename": filename}),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/download-file/{job_id}")))
        .and(query_param("filename", filename))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

pub async fn mount_progress(server: &MockServer, job_id: &str, events: &[Value]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/download-progress/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(events), "text/event-stream"),
        )
        .mount(server)
        .await;
}

/// Serves every request with a body of `chunks` x `chunk_size` bytes, one
/// chunk every `interval`. Wiremock only delays headers, so slow bodies need
/// a raw socket. Returns the server's base URL.
pub async fn spawn_slow_body_server(chunks: usize, chunk_size: usize, interval: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind slow body server");
    let addr = listener.local_addr().expect("slow body server address");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0_u8; 4096];
                if socket.read(&mut request).await.is_err() {
                    return;
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: video/mp4\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    chunks * chunk_size
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let chunk = vec![b'x'; chunk_size];
                for _ in 0..chunks {
                    tokio::time::sleep(interval).await;
                    if socket.write_all(&chunk).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}
