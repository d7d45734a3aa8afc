// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google TTS against a local stub of `translate_tts`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vision2lang::tts::{GoogleTts, SpeechSynthesizer, TtsError};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn spawn_stub(status: StatusCode) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/translate_tts",
            get(
                move |State(seen): State<Seen>, Query(params): Query<HashMap<String, String>>| async move {
                    let idx = params.get("idx").cloned().unwrap_or_default();
                    seen.lock().unwrap().push(params);
                    (status, format!("mp3-{};", idx))
                },
            ),
        )
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_short_text_single_request() {
    let (base_url, seen) = spawn_stub(StatusCode::OK).await;
    let tts = GoogleTts::new(&base_url, "en", false, Duration::from_secs(5)).unwrap();

    let audio = tts.synthesize("a red car parked on the street").await.unwrap();

    assert_eq!(audio.bytes, b"mp3-0;");
    assert_eq!(audio.backend, "google");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["q"], "a red car parked on the street");
    assert_eq!(seen[0]["tl"], "en");
    assert_eq!(seen[0]["client"], "tw-ob");
    assert_eq!(seen[0]["ttsspeed"], "1");
}

#[tokio::test]
async fn test_long_text_is_chunked_and_concatenated() {
    let (base_url, seen) = spawn_stub(StatusCode::OK).await;
    let tts = GoogleTts::new(&base_url, "en", true, Duration::from_secs(5)).unwrap();

    let text = "word ".repeat(60);
    let audio = tts.synthesize(&text).await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 3);
    assert!(seen.iter().all(|p| p["q"].chars().count() <= 100));
    assert!(seen.iter().all(|p| p["ttsspeed"] == "0.3"));
    let expected: String = (0..seen.len()).map(|i| format!("mp3-{};", i)).collect();
    assert_eq!(audio.bytes, expected.into_bytes());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (base_url, _) = spawn_stub(StatusCode::TOO_MANY_REQUESTS).await;
    let tts = GoogleTts::new(&base_url, "en", false, Duration::from_secs(5)).unwrap();

    match tts.synthesize("hello").await {
        Err(TtsError::Status { status, .. }) => assert_eq!(status, 429),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_request_error() {
    let tts = GoogleTts::new("http://127.0.0.1:9", "en", false, Duration::from_secs(2)).unwrap();
    assert!(matches!(
        tts.synthesize("hello").await,
        Err(TtsError::Request(_))
    ));
}
