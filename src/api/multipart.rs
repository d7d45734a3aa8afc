// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart form parsing for the upload endpoints

use axum_extra::extract::Multipart;
use std::collections::HashMap;

use super::errors::ApiError;

/// Fields of an upload form
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Raw bytes of the `image` part, if any
    pub image: Option<Vec<u8>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Failed to read image: {}", e)))?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Failed to read {}: {}", name, e)))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// `maxLength` as a number; absent or blank means the server default
    pub fn max_length(&self) -> Result<Option<usize>, ApiError> {
        match self.text("maxLength").map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ApiError::validation("maxLength", format!("invalid number '{}'", value))),
        }
    }

    /// `tts` checkbox; defaults to on
    pub fn tts(&self) -> bool {
        match self.text("tts").map(|v| v.trim().to_lowercase()) {
            None => true,
            Some(v) => matches!(v.as_str(), "1" | "true" | "on" | "yes"),
        }
    }

    pub fn require_image(&self) -> Result<&[u8], ApiError> {
        self.image.as_deref().ok_or_else(ApiError::missing_image)
    }
}
