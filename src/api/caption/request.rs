// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::config::validate_max_length;

pub(crate) fn default_tts() -> bool {
    true
}

/// Request for image captioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    /// Base64-encoded image or data URL
    #[serde(default)]
    pub image: Option<String>,

    /// Maximum generated tokens (2-512), server default when absent
    #[serde(default)]
    pub max_length: Option<usize>,

    /// Also return synthesized speech
    #[serde(default = "default_tts")]
    pub tts: bool,
}

impl CaptionRequest {
    /// Validate the caption request
    pub fn validate(&self) -> Result<(), ApiError> {
        require_image(self.image.as_deref())?;
        validate_optional_max_length(self.max_length)
    }
}

pub(crate) fn require_image(image: Option<&str>) -> Result<&str, ApiError> {
    match image.map(str::trim) {
        Some(image) if !image.is_empty() => Ok(image),
        _ => Err(ApiError::missing_image()),
    }
}

pub(crate) fn validate_optional_max_length(max_length: Option<usize>) -> Result<(), ApiError> {
    match max_length {
        Some(max_length) => {
            validate_max_length(max_length).map_err(|message| ApiError::validation("maxLength", message))
        }
        None => Ok(()),
    }
}
