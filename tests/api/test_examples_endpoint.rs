// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /v1/examples and /v1/examples/:name

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use vision2lang::api::{create_app, AppState};

use crate::common::{png_bytes, test_state, FakeLoader};

fn state_with_examples(dir: &std::path::Path) -> AppState {
    let mut state = test_state(Arc::new(FakeLoader::new()));
    state.data_dir = dir.to_path_buf();
    state
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_list_examples() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("car.png"), png_bytes(4, 4)).unwrap();
    std::fs::write(dir.path().join("dog.jpg"), b"jpeg").unwrap();
    std::fs::write(dir.path().join("readme.md"), b"# examples").unwrap();

    let app = create_app(state_with_examples(dir.path()));
    let response = app.oneshot(get("/v1/examples")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let names: Vec<&str> = body["examples"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["car.png", "dog.jpg"]);
    assert_eq!(body["examples"][0]["url"], "/v1/examples/car.png");
}

#[tokio::test]
async fn test_serve_example() {
    let dir = tempfile::tempdir().unwrap();
    let png = png_bytes(4, 4);
    std::fs::write(dir.path().join("car.png"), &png).unwrap();

    let app = create_app(state_with_examples(dir.path()));
    let response = app.oneshot(get("/v1/examples/car.png")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), png.as_slice());
}

#[tokio::test]
async fn test_missing_example_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(state_with_examples(dir.path()));
    let response = app.oneshot(get("/v1/examples/nope.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_image_example_is_404() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();
    let app = create_app(state_with_examples(dir.path()));
    let response = app.oneshot(get("/v1/examples/secret.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(state_with_examples(dir.path()));
    let response = app
        .oneshot(get("/v1/examples/..%2Fsecret.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
