// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::api::caption::request::{default_tts, validate_optional_max_length};
use crate::api::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebcamRequest {
    /// Browser-captured frame; absent means capture on the server
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default = "default_tts")]
    pub tts: bool,
}

impl WebcamRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_optional_max_length(self.max_length)
    }

    /// The supplied frame, ignoring blank strings
    pub fn frame(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
    }
}
