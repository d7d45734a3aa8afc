// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for model loading and inference

use thiserror::Error;

use super::image_utils::ImageError;

/// Failure while fetching or building a model
#[derive(Debug, Error, Clone)]
pub enum LoadError {
    #[error("Failed to fetch {file} from {repo}: {message}")]
    Fetch {
        repo: String,
        file: String,
        message: String,
    },

    #[error("Model file not found: {0}")]
    MissingFile(String),

    #[error("Failed to load tokenizer from {path}: {message}")]
    Tokenizer { path: String, message: String },

    #[error("Failed to build inference session from {path}: {message}")]
    Session { path: String, message: String },

    /// Accelerator could not host the model (out of memory, provider failure)
    #[error("{device} device failed: {message}")]
    Device { device: String, message: String },

    #[error("Model load task failed: {0}")]
    Join(String),
}

impl LoadError {
    /// Whether a CPU retry may succeed
    pub fn is_device_failure(&self) -> bool {
        matches!(self, LoadError::Device { .. })
    }
}

/// Failure of a caption or answer request
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] LoadError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned an empty {0}")]
    EmptyOutput(String),
}

impl VisionError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        VisionError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}
