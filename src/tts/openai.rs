// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible speech endpoint (`POST /v1/audio/speech`)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{SpeechAudio, TtsError};
use super::SpeechSynthesizer;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Client for a TTS sidecar speaking the OpenAI audio API
pub struct OpenAiTts {
    client: Client,
    endpoint: String,
    model: String,
    voice: String,
}

impl OpenAiTts {
    pub fn new(endpoint: &str, model: &str, voice: &str, timeout: Duration) -> Result<Self, TtsError> {
        if endpoint.trim().is_empty() {
            return Err(TtsError::Config("TTS endpoint must not be empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "OpenAI-compatible TTS configured: endpoint={}, model={}, voice={}",
            endpoint, model, voice
        );

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            voice: voice.to_string(),
        })
    }

    /// Check if the sidecar answers on `/health`
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("TTS health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, TtsError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let url = format!("{}/v1/audio/speech", self.endpoint);
        debug!("TTS POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice: &self.voice,
                response_format: "mp3",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        Ok(SpeechAudio::mp3(bytes.to_vec(), self.name()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
