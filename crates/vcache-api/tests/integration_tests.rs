//! # Integration Tests for vcache-api
//!
//! Drives the full router (context middleware, tracing, handlers) against a
//! filesystem store in a temporary directory, plus a failing store for the
//! opaque-error path.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tokio::io::AsyncRead;
use tower::ServiceExt;

use vcache_api::{Access, AppState};
use vcache_core::{
    ArtifactId, ArtifactReader, ArtifactStore, FsStore, FsStoreConfig, StoreError,
};

const ARTIFACT: &str = "/libfoo/1.2.3/abcd1234";

/// Helper: build the app over a fresh store; keep the tempdir alive.
async fn test_app(access: Access) -> (axum::Router, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FsStore::open(FsStoreConfig::new(tmp.path())).await.unwrap();
    let state = AppState::new(Arc::new(store)).with_access(access);
    (vcache_api::app(state), tmp)
}

/// Helper: send one request through a clone of the router.
async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: impl Into<Body>,
) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// -- Probe and Path Shape -----------------------------------------------------

#[tokio::test]
async fn test_root_probe() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let response = send(&app, Method::GET, "/", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_root_probe_ignores_access_flags() {
    let (app, _tmp) = test_app(Access::WRITE_ONLY).await;
    let response = send(&app, Method::GET, "/", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_root_other_verbs_are_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    for method in [Method::PUT, Method::HEAD, Method::POST, Method::DELETE] {
        let response = send(&app, method.clone(), "/", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} /");
    }
}

#[tokio::test]
async fn test_wrong_segment_count_is_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let paths = ["/foo", "/foo/bar", "/foo/bar/baz/qux", "/foo//bar"];
    for path in paths {
        for method in [Method::GET, Method::HEAD, Method::PUT, Method::DELETE] {
            let response = send(&app, method.clone(), path, Body::empty()).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {path}");
        }
    }
}

#[tokio::test]
async fn test_dot_segment_is_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let response = send(&app, Method::PUT, "/.hidden/1.0/abc", "x").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, Method::GET, "/zlib/1.0/%2E%2E", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_encoded_separator_is_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let response = send(&app, Method::PUT, "/zlib/1.0/a%2Fb", "x").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_verb_is_not_implemented() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    for method in [Method::POST, Method::DELETE, Method::PATCH] {
        let response = send(&app, method.clone(), ARTIFACT, Body::empty()).await;
        assert_eq!(
            response.status(),
            StatusCode::NOT_IMPLEMENTED,
            "{method} {ARTIFACT}"
        );
    }
}

// -- Artifact Lifecycle -------------------------------------------------------

#[tokio::test]
async fn test_put_get_conflict_head() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;

    let response = send(&app, Method::PUT, ARTIFACT, "hello").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(body_string(response).await, "hello");

    let response = send(&app, Method::PUT, ARTIFACT, "other").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, Method::HEAD, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
    assert!(body_string(response).await.is_empty());

    // The losing write did not disturb the stored bytes.
    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    assert_eq!(body_string(response).await, "hello");
}

#[tokio::test]
async fn test_empty_artifact() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let response = send(&app, Method::PUT, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::HEAD, ARTIFACT, Body::empty()).await;
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");

    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_missing_artifact_is_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    for method in [Method::GET, Method::HEAD] {
        let response = send(&app, method.clone(), ARTIFACT, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn test_other_version_is_not_found() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    send(&app, Method::PUT, "/zlib/1.3/0123abcd", "v13").await;
    let response = send(&app, Method::GET, "/zlib/1.2/0123abcd", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_large_artifact_streams_through() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let payload: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();

    let response = send(&app, Method::PUT, ARTIFACT, payload.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), payload.len());
    assert!(bytes[..] == payload[..]);
}

#[tokio::test]
async fn test_concurrent_distinct_puts() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let mut tasks = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let uri = format!("/pkg{i}/1.0/hash{i}");
            let response = send(&app, Method::PUT, &uri, format!("body{i}")).await;
            response.status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    for i in 0..16 {
        let uri = format!("/pkg{i}/1.0/hash{i}");
        let response = send(&app, Method::GET, &uri, Body::empty()).await;
        assert_eq!(body_string(response).await, format!("body{i}"));
    }
}

#[tokio::test]
async fn test_concurrent_same_identity_single_winner() {
    let (app, _tmp) = test_app(Access::READ_WRITE).await;
    let mut tasks = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            send(&app, Method::PUT, ARTIFACT, format!("writer{i}"))
                .await
                .status()
        }));
    }
    let mut ok = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 1);
}

// -- Access Flags -------------------------------------------------------------

#[tokio::test]
async fn test_reads_disabled() {
    let (app, _tmp) = test_app(Access::WRITE_ONLY).await;

    let response = send(&app, Method::PUT, ARTIFACT, "hello").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    // HEAD is not gated by the read flag.
    let response = send(&app, Method::HEAD, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_writes_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(FsStore::open(FsStoreConfig::new(tmp.path())).await.unwrap());
    let id = ArtifactId::new("libfoo", "1.2.3", "abcd1234").unwrap();
    store.put(&id, &mut &b"seeded"[..]).await.unwrap();

    let app = vcache_api::app(AppState::new(store).with_access(Access::READ_ONLY));

    let response = send(&app, Method::PUT, "/zlib/1.3/fresh", "x").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = send(&app, Method::GET, ARTIFACT, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "seeded");

    let response = send(&app, Method::HEAD, ARTIFACT, Body::empty()).await;
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "6");
}

#[tokio::test]
async fn test_disabled_write_does_not_hide_bad_path() {
    let (app, _tmp) = test_app(Access::READ_ONLY).await;
    let response = send(&app, Method::PUT, "/only/two", "x").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Store Failures -----------------------------------------------------------

/// Store whose every operation fails with an opaque I/O error.
struct BrokenStore;

fn broken() -> StoreError {
    StoreError::io("open artifact", std::io::Error::other("device offline"))
}

#[async_trait]
impl ArtifactStore for BrokenStore {
    async fn get(&self, _id: &ArtifactId) -> Result<ArtifactReader, StoreError> {
        Err(broken())
    }

    async fn head(&self, _id: &ArtifactId) -> Result<u64, StoreError> {
        Err(broken())
    }

    async fn put(
        &self,
        _id: &ArtifactId,
        _body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StoreError> {
        Err(broken())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = vcache_api::app(AppState::new(Arc::new(BrokenStore)));
    for method in [Method::GET, Method::HEAD, Method::PUT] {
        let response = send(&app, method.clone(), ARTIFACT, "x").await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{method}"
        );
        if method != Method::HEAD {
            let body = body_string(response).await;
            assert!(!body.contains("device offline"), "leaked: {body}");
        }
    }
}
