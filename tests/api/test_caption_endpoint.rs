// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /v1/caption and /v1/caption/upload

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use vision2lang::api::{create_app, AppState};
use vision2lang::tts::SpeechService;
use vision2lang::webcam::UnavailableSource;

use crate::common::{png_base64, png_bytes, test_state, workflows, FailingSynth, FakeLoader, CAPTION_TEXT};

const BOUNDARY: &str = "vision2lang-test-boundary";

fn json_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/caption")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn multipart_body(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub(crate) fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_caption_with_audio() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app
        .oneshot(json_request(json!({"image": png_base64(64, 48)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], CAPTION_TEXT);
    assert_eq!(body["task"], "caption");
    assert_eq!(body["model"], "fake/caption");
    assert_eq!(body["device"], "cpu");
    assert_eq!(body["audioFormat"], "mp3");
    assert!(!body["audio"].as_str().unwrap().is_empty());
    assert!(body["processingTimeMs"].is_u64());
}

#[tokio::test]
async fn test_caption_accepts_data_url() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let image = format!("data:image/png;base64,{}", png_base64(16, 16));
    let response = app
        .oneshot(json_request(json!({"image": image, "tts": false})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("audio").is_none());
}

#[tokio::test]
async fn test_caption_respects_max_length() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app
        .oneshot(json_request(
            json!({"image": png_base64(16, 16), "maxLength": 3, "tts": false}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"].as_str().unwrap().split_whitespace().count(), 3);
}

#[tokio::test]
async fn test_missing_image_is_400() {
    let loader = Arc::new(FakeLoader::new());
    let app = create_app(test_state(loader.clone()));
    let response = app.oneshot(json_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "validation_error");
    assert_eq!(body["message"], "Please upload an image first.");
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_400() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app
        .oneshot(json_request(json!({"image": "aGVsbG8gd29ybGQ="})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"]["field"], "image");
}

#[tokio::test]
async fn test_max_length_out_of_range_is_400() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let response = app
        .oneshot(json_request(json!({"image": png_base64(8, 8), "maxLength": 1000})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"]["field"], "maxLength");
}

#[tokio::test]
async fn test_load_failure_is_503_then_recovers() {
    let loader = Arc::new(FakeLoader::new().with_fetch_failures(1));
    let app = create_app(test_state(loader.clone()));

    let response = app
        .clone()
        .oneshot(json_request(json!({"image": png_base64(8, 8)})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("connection refused"));

    let response = app
        .oneshot(json_request(json!({"image": png_base64(8, 8)})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn test_empty_model_output_is_500() {
    let loader = Arc::new(FakeLoader::new().with_caption_text("   "));
    let app = create_app(test_state(loader));
    let response = app
        .oneshot(json_request(json!({"image": png_base64(8, 8)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "internal_error");
}

#[tokio::test]
async fn test_tts_failure_still_returns_caption() {
    let speech = SpeechService::with_synthesizer(Arc::new(FailingSynth));
    let state = AppState::new(
        workflows(
            Arc::new(FakeLoader::new()),
            speech,
            Arc::new(UnavailableSource::new("none")),
        ),
        "data",
    );
    let app = create_app(state);
    let response = app
        .oneshot(json_request(json!({"image": png_base64(8, 8)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], CAPTION_TEXT);
    assert!(body.get("audio").is_none());
}

#[tokio::test]
async fn test_upload_caption() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let body = multipart_body(Some(&png_bytes(40, 30)), &[("maxLength", "4"), ("tts", "false")]);
    let response = app
        .oneshot(multipart_request("/v1/caption/upload", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], "a red car parked");
    assert!(body.get("audio").is_none());
}

#[tokio::test]
async fn test_upload_without_image_is_400() {
    let app = create_app(test_state(Arc::new(FakeLoader::new())));
    let body = multipart_body(None, &[("tts", "true")]);
    let response = app
        .oneshot(multipart_request("/v1/caption/upload", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Please upload an image first.");
}
