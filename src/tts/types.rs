// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Speech synthesis types

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MP3_MIME_TYPE: &str = "audio/mpeg";

/// Synthesized audio
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Backend that produced the audio
    pub backend: String,
}

impl SpeechAudio {
    pub fn mp3(bytes: Vec<u8>, backend: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: MP3_MIME_TYPE.to_string(),
            backend: backend.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Short format name for API responses
    pub fn format(&self) -> &'static str {
        if self.mime_type == MP3_MIME_TYPE {
            "mp3"
        } else {
            "bin"
        }
    }

    /// Write the audio to a new temporary `.mp3` file that outlives this process
    pub fn persist(&self) -> Result<PathBuf, TtsError> {
        let file = tempfile::Builder::new()
            .prefix("vision2lang-")
            .suffix(".mp3")
            .tempfile()?;
        std::fs::write(file.path(), &self.bytes)?;
        let (_, path) = file.keep().map_err(|e| TtsError::Io(e.error.to_string()))?;
        Ok(path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), TtsError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Speech synthesis errors
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Text is empty")]
    EmptyText,

    #[error("TTS request failed: {0}")]
    Request(String),

    #[error("TTS backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("TTS backend returned no audio")]
    EmptyAudio,

    #[error("TTS I/O error: {0}")]
    Io(String),

    #[error("TTS configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        TtsError::Request(e.to_string())
    }
}

impl From<std::io::Error> for TtsError {
    fn from(e: std::io::Error) -> Self {
        TtsError::Io(e.to_string())
    }
}
