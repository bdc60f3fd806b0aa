//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with the mock encoder injected, enabling end-to-end testing of uploads,
//! status polling and artifact serving without FFmpeg.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hlsladder_core::{
    testing::MockEncoder, Config, JobRunner, Ladder, ProgressStore, StorageConfig,
};
use hlsladder_server::state::AppState;

/// Re-export fixtures for test convenience
pub use hlsladder_core::testing::fixtures;

const BOUNDARY: &str = "hlsladder-test-boundary";

/// Test fixture for E2E testing with the mock encoder.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new();
///     let response = fixture.upload("clip.mp4", b"data").await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock encoder - script per-rendition outcomes
    pub encoder: Arc<MockEncoder>,
    /// Runner behind the router
    pub runner: JobRunner,
    /// Upload directory backing the server
    pub upload_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for non-JSON bodies
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with a short three-rung ladder.
    pub fn new() -> Self {
        Self::with_ladder(fixtures::short_ladder())
    }

    /// Create a test fixture with a custom ladder.
    pub fn with_ladder(ladder: Ladder) -> Self {
        let upload_dir = TempDir::new().expect("Failed to create upload dir");

        let mut config = Config::default();
        config.storage = StorageConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        config.ladder.renditions = ladder
            .iter()
            .map(|r| hlsladder_core::RenditionConfig {
                height: r.height,
                bitrate_kbps: r.bitrate_kbps,
                label: r.label.clone(),
            })
            .collect();

        let encoder = Arc::new(MockEncoder::new());
        let runner = JobRunner::new(encoder.clone(), Arc::new(ProgressStore::new()));
        let state = Arc::new(AppState::new(config, ladder, runner.clone()));
        let router = hlsladder_server::api::create_router(state);

        Self {
            router,
            encoder,
            runner,
            upload_dir,
        }
    }

    pub fn upload_path(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let raw = self.get_raw(path).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Upload a file in the `video` field.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> TestResponse {
        self.upload_field("video", filename, data).await
    }

    /// Upload a file in an arbitrary multipart field.
    pub async fn upload_field(&self, field: &str, filename: &str, data: &[u8]) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    /// Poll `/status/{filename}` until its `status` equals `expected`.
    pub async fn wait_for_status(&self, filename: &str, expected: &str) -> TestResponse {
        for _ in 0..200 {
            let response = self.get(&format!("/status/{}", filename)).await;
            if response.body["status"] == expected {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never reached status {}", filename, expected);
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            content_type,
            bytes,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
