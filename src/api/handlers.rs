// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Health, model listing, speech and example gallery handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

use super::errors::ApiError;
use super::http_server::AppState;
use crate::version;
use crate::vision::image_utils::is_example_image;
use crate::vision::ModelStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub build: serde_json::Value,
    pub uptime_secs: u64,
    pub models: Vec<ModelStatus>,
    /// Active speech backend, absent when speech is disabled
    pub tts: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelStatus>,
    pub device_preference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExampleImage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub examples: Vec<ExampleImage>,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let workflows = &state.workflows;
    Json(HealthResponse {
        status: "healthy",
        version: version::VERSION_NUMBER,
        build: version::get_version_info(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        models: workflows.adapter().manager().list_models(),
        tts: workflows.speech().backend(),
    })
}

/// GET /v1/models
pub async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let manager = state.workflows.adapter().manager();
    Json(ModelsResponse {
        models: manager.list_models(),
        device_preference: manager.device_preference().to_string(),
    })
}

/// POST /v1/speak - Synthesize speech and return the raw audio
pub async fn speak_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<SpeakRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let audio = state.workflows.speech().synthesize(&request.text).await?;
    Ok(([(header::CONTENT_TYPE, audio.mime_type)], audio.bytes).into_response())
}

/// GET /v1/examples - List example images from the data directory
pub async fn examples_handler(State(state): State<AppState>) -> Result<Json<ExamplesResponse>, ApiError> {
    let names = list_example_images(&state.data_dir).await?;
    let examples = names
        .into_iter()
        .map(|name| ExampleImage {
            url: format!("/v1/examples/{}", name),
            name,
        })
        .collect();
    Ok(Json(ExamplesResponse { examples }))
}

/// GET /v1/examples/:name - Serve one example image
pub async fn example_file_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_file_name(&name) {
        return Err(ApiError::validation("name", "invalid example name"));
    }
    if !is_example_image(&name) {
        return Err(ApiError::NotFound(format!("example '{}'", name)));
    }

    let path = state.data_dir.join(&name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("example '{}'", name)));
        }
        Err(e) => return Err(ApiError::InternalError(format!("failed to read {}: {}", name, e))),
    };

    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response())
}

/// Sorted example image names; a missing directory is an empty gallery
pub async fn list_example_images(dir: &FsPath) -> Result<Vec<String>, ApiError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ApiError::InternalError(format!(
                "failed to read {}: {}",
                dir.display(),
                e
            )))
        }
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if let Some(name) = entry.file_name().to_str() {
            if is_file && is_example_image(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

fn content_type_for(name: &str) -> &'static str {
    if name.to_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}
