// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-to-speech
//!
//! Backends implement [`SpeechSynthesizer`]; [`SpeechService`] picks one from
//! configuration and degrades to text-only output when synthesis fails.

pub mod google;
pub mod openai;
pub mod service;
pub mod types;

pub use google::{split_text, GoogleTts};
pub use openai::OpenAiTts;
pub use service::SpeechService;
pub use types::{SpeechAudio, TtsError, MP3_MIME_TYPE};

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Trait for speech synthesis backends
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Convert text to playable audio
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, TtsError>;

    /// Backend name for logging and responses
    fn name(&self) -> &'static str;
}

/// Configured TTS backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    Google,
    OpenAi,
    None,
}

impl FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gtts" => Ok(TtsProvider::Google),
            "openai" => Ok(TtsProvider::OpenAi),
            "none" | "off" | "disabled" => Ok(TtsProvider::None),
            other => Err(format!(
                "unknown TTS provider '{}' (expected google, openai or none)",
                other
            )),
        }
    }
}

impl fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TtsProvider::Google => "google",
            TtsProvider::OpenAi => "openai",
            TtsProvider::None => "none",
        };
        f.write_str(name)
    }
}
