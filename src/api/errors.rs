// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::multipart::MultipartRejection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::tts::TtsError;
use crate::vision::{ImageError, VisionError};
use crate::webcam::CaptureError;
use crate::workflows::WorkflowError;

/// Message shown when a workflow is started without an image
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    ServiceUnavailable(String),
    UpstreamError(String),
    InternalError(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing_image() -> Self {
        Self::validation("image", MISSING_IMAGE_MESSAGE)
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::UpstreamError(msg) => ("upstream_error", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::UpstreamError(_) => 502,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::InvalidRequest(format!("Expected a multipart upload: {}", rejection))
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        ApiError::validation("image", e.to_string())
    }
}

impl From<VisionError> for ApiError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::InvalidInput { field, message } => ApiError::validation(field, message),
            VisionError::Image(e) => e.into(),
            VisionError::ModelUnavailable(e) => ApiError::ServiceUnavailable(e.to_string()),
            VisionError::Inference(_) | VisionError::EmptyOutput(_) => {
                ApiError::InternalError(e.to_string())
            }
        }
    }
}

impl From<CaptureError> for ApiError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Unavailable(_) => ApiError::ServiceUnavailable(e.to_string()),
            _ => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Capture(e) => e.into(),
            WorkflowError::Vision(e) => e.into(),
        }
    }
}

impl From<TtsError> for ApiError {
    fn from(e: TtsError) -> Self {
        match e {
            TtsError::EmptyText => ApiError::validation("text", "text must not be empty"),
            TtsError::Config(_) => ApiError::ServiceUnavailable(e.to_string()),
            _ => ApiError::UpstreamError(e.to_string()),
        }
    }
}
