// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::caption::{caption_handler, caption_upload_handler};
use super::handlers::{
    example_file_handler, examples_handler, health_handler, models_handler, speak_handler,
};
use super::ui::index_handler;
use super::vqa::{vqa_handler, vqa_upload_handler};
use super::webcam::webcam_handler;
use crate::config::AppConfig;
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::workflows::Workflows;

/// Request body limit; base64 inflates a maximum-size image by a third
pub const MAX_BODY_BYTES: usize = MAX_IMAGE_SIZE * 4 / 3 + 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub workflows: Workflows,
    /// Directory holding the example images
    pub data_dir: PathBuf,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(workflows: Workflows, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflows,
            data_dir: data_dir.into(),
            started_at: Instant::now(),
        }
    }
}

/// Build the router with all routes and layers
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/v1/models", get(models_handler))
        .route("/v1/caption", post(caption_handler))
        .route("/v1/caption/upload", post(caption_upload_handler))
        .route("/v1/vqa", post(vqa_handler))
        .route("/v1/vqa/upload", post(vqa_upload_handler))
        .route("/v1/webcam", post(webcam_handler))
        .route("/v1/speak", post(speak_handler))
        .route("/v1/examples", get(examples_handler))
        .route("/v1/examples/:name", get(example_file_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C
pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let app = create_app(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("🌐 HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
