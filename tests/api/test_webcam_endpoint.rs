// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /v1/webcam

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::GenericImageView;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use vision2lang::api::{create_app, AppState};
use vision2lang::tts::SpeechService;

use crate::common::{png_base64, test_state, workflows, FakeLoader, StaticFrameSource, CAPTION_TEXT};

fn webcam_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/webcam")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn decode_frame(body: &Value) -> image::DynamicImage {
    let bytes = STANDARD
        .decode(body["frame"]["image"].as_str().unwrap())
        .unwrap();
    image::load_from_memory(&bytes).unwrap()
}

#[tokio::test]
async fn test_browser_frame_is_captioned() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app
        .oneshot(webcam_request(json!({"image": png_base64(320, 240), "tts": false})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], CAPTION_TEXT);
    assert_eq!(body["frame"]["source"], "browser");
    assert_eq!(decode_frame(&body).dimensions(), (320, 240));
}

#[tokio::test]
async fn test_server_frame_is_resized_for_display() {
    let state = AppState::new(
        workflows(
            Arc::new(FakeLoader::new()),
            SpeechService::disabled(),
            Arc::new(StaticFrameSource),
        ),
        "data",
    );
    let app = create_app(state);
    let response = app.oneshot(webcam_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["frame"]["source"], "/dev/video0");
    assert_eq!(body["frame"]["width"], 1280);
    let (width, height) = decode_frame(&body).dimensions();
    assert!(width <= 800 && height <= 600, "{}x{}", width, height);
    assert_eq!((width, height), (800, 600));
}

#[tokio::test]
async fn test_no_camera_is_503() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app.oneshot(webcam_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "service_unavailable");
}
