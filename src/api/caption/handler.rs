// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption endpoint handlers

use axum::{extract::State, Json};
use axum_extra::extract::{Multipart, WithRejection};

use super::request::{validate_optional_max_length, CaptionRequest};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::multipart::UploadForm;
use crate::api::response::WorkflowResponse;
use crate::vision::{decode_base64_image, decode_image_bytes};

/// POST /v1/caption - Caption a base64-encoded image
pub async fn caption_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<CaptionRequest>, ApiError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    request.validate()?;
    let image = request.image.as_deref().unwrap_or_default();
    let (image, info) = decode_base64_image(image)?;
    tracing::debug!(
        "Caption request: {}x{} {:?}",
        info.width,
        info.height,
        info.format
    );

    let output = state
        .workflows
        .caption_with_audio(&image, request.max_length, request.tts)
        .await?;

    Ok(Json(WorkflowResponse::from_output(output)))
}

/// POST /v1/caption/upload - Caption an uploaded image file
pub async fn caption_upload_handler(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let form = UploadForm::parse(multipart).await?;
    let bytes = form.require_image()?;
    let max_length = form.max_length()?;
    validate_optional_max_length(max_length)?;

    let (image, _) = decode_image_bytes(bytes)?;
    let output = state
        .workflows
        .caption_with_audio(&image, max_length, form.tts())
        .await?;

    Ok(Json(WorkflowResponse::from_output(output)))
}
