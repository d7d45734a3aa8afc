// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use super::request::WebcamRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::response::WorkflowResponse;
use crate::vision::image_utils::{encode_png_base64, DISPLAY_MAX_HEIGHT, DISPLAY_MAX_WIDTH};
use crate::vision::{decode_base64_image, resize_for_display};
use crate::webcam::CapturedFrame;

/// POST /v1/webcam - Caption a webcam frame
///
/// Returns the caption together with the frame, resized for display.
pub async fn webcam_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<WebcamRequest>, ApiError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    request.validate()?;

    let frame = match request.frame() {
        Some(image) => {
            let (image, _) = decode_base64_image(image)?;
            Some(CapturedFrame::new(image, "browser"))
        }
        None => None,
    };

    let (frame, output) = state
        .workflows
        .capture_and_caption(frame, request.max_length, request.tts)
        .await?;

    let display = resize_for_display(&frame.image, DISPLAY_MAX_WIDTH, DISPLAY_MAX_HEIGHT);
    let display_png = encode_png_base64(&display).map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(
        WorkflowResponse::from_output(output).with_frame(&frame, display_png),
    ))
}
