// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use axum_extra::extract::{Multipart, WithRejection};

use super::request::{require_question, VqaRequest};
use crate::api::caption::request::validate_optional_max_length;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::multipart::UploadForm;
use crate::api::response::WorkflowResponse;
use crate::vision::{decode_base64_image, decode_image_bytes};

/// POST /v1/vqa - Answer a question about a base64-encoded image
pub async fn vqa_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<VqaRequest>, ApiError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    request.validate()?;
    let (image, _) = decode_base64_image(request.image.as_deref().unwrap_or_default())?;
    let question = request.question.as_deref().unwrap_or_default();

    let output = state
        .workflows
        .answer_with_audio(&image, question, request.max_length, request.tts)
        .await?;

    Ok(Json(WorkflowResponse::from_output(output)))
}

/// POST /v1/vqa/upload - Answer a question about an uploaded image file
pub async fn vqa_upload_handler(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let form = UploadForm::parse(multipart).await?;
    let bytes = form.require_image()?;
    let question = require_question(form.text("question"))?;
    let max_length = form.max_length()?;
    validate_optional_max_length(max_length)?;

    let (image, _) = decode_image_bytes(bytes)?;
    let output = state
        .workflows
        .answer_with_audio(&image, question, max_length, form.tts())
        .await?;

    Ok(Json(WorkflowResponse::from_output(output)))
}
