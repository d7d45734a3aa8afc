// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Speech service: backend selection and non-fatal synthesis

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::google::GoogleTts;
use super::openai::OpenAiTts;
use super::types::{SpeechAudio, TtsError};
use super::{SpeechSynthesizer, TtsProvider};
use crate::config::TtsConfig;

/// Optional text-to-speech for workflow results
#[derive(Clone, Default)]
pub struct SpeechService {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl SpeechService {
    pub fn from_config(config: &TtsConfig) -> Result<Self, TtsError> {
        let provider = config
            .provider
            .parse::<TtsProvider>()
            .map_err(TtsError::Config)?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = match provider {
            TtsProvider::Google => Some(Arc::new(GoogleTts::new(
                &config.google_base_url,
                &config.lang,
                config.slow,
                timeout,
            )?)),
            TtsProvider::OpenAi => {
                let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                    TtsError::Config("TTS provider 'openai' requires an endpoint".to_string())
                })?;
                Some(Arc::new(OpenAiTts::new(
                    endpoint,
                    &config.model,
                    &config.voice,
                    timeout,
                )?))
            }
            TtsProvider::None => None,
        };

        match &synthesizer {
            Some(s) => info!("🔊 Text-to-speech enabled ({})", s.name()),
            None => info!("🔇 Text-to-speech disabled"),
        }

        Ok(Self { synthesizer })
    }

    pub fn disabled() -> Self {
        Self { synthesizer: None }
    }

    pub fn with_synthesizer(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer: Some(synthesizer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn backend(&self) -> Option<&'static str> {
        self.synthesizer.as_ref().map(|s| s.name())
    }

    /// Synthesize, reporting every failure
    pub async fn synthesize(&self, text: &str) -> Result<SpeechAudio, TtsError> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| TtsError::Config("text-to-speech is disabled".to_string()))?;

        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let audio = synthesizer.synthesize(text).await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(audio)
    }

    /// Synthesize for a workflow result
    ///
    /// Failures are logged and yield `None` so the caller still returns text.
    pub async fn speak(&self, text: &str) -> Option<SpeechAudio> {
        if !self.is_enabled() || text.trim().is_empty() {
            return None;
        }

        match self.synthesize(text).await {
            Ok(audio) => {
                info!("🔊 Audio generated ({} bytes via {})", audio.len(), audio.backend);
                Some(audio)
            }
            Err(e) => {
                warn!("⚠️ Speech synthesis failed, returning text only: {}", e);
                None
            }
        }
    }
}
