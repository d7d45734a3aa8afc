// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::api::caption::request::{default_tts, require_image, validate_optional_max_length};
use crate::api::errors::ApiError;

/// Message shown when a question is missing
pub const MISSING_QUESTION_MESSAGE: &str = "Please enter a question.";

/// Request for visual question answering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VqaRequest {
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default = "default_tts")]
    pub tts: bool,
}

impl VqaRequest {
    /// Image is checked before the question, matching the UI's prompts
    pub fn validate(&self) -> Result<(), ApiError> {
        require_image(self.image.as_deref())?;
        require_question(self.question.as_deref())?;
        validate_optional_max_length(self.max_length)
    }
}

pub(crate) fn require_question(question: Option<&str>) -> Result<&str, ApiError> {
    match question.map(str::trim) {
        Some(question) if !question.is_empty() => Ok(question),
        _ => Err(ApiError::validation("question", MISSING_QUESTION_MESSAGE)),
    }
}
