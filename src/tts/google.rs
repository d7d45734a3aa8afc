// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Translate text-to-speech
//!
//! The endpoint accepts at most 100 characters per request, so text is
//! split into chunks and the returned MP3 streams are concatenated. MP3
//! frames are self-delimiting, so the concatenation plays as one file.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::types::{SpeechAudio, TtsError};
use super::SpeechSynthesizer;

/// Maximum characters per request
pub const MAX_CHUNK_CHARS: usize = 100;

const SENTENCE_PUNCTUATION: &[char] = &['.', '!', '?', ';', ':', ',', '\n', '。', '、', '？', '！'];

/// Client for the `translate_tts` endpoint
pub struct GoogleTts {
    client: Client,
    base_url: String,
    lang: String,
    slow: bool,
}

impl GoogleTts {
    pub fn new(base_url: &str, lang: &str, slow: bool, timeout: Duration) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) vision2lang")
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!(
            "Google TTS configured: base_url={}, lang={}, slow={}",
            base_url, lang, slow
        );

        Ok(Self {
            client,
            base_url,
            lang: lang.to_string(),
            slow,
        })
    }

    fn chunk_url(&self, chunk: &str, index: usize, total: usize) -> Result<Url, TtsError> {
        let mut url = Url::parse(&format!("{}/translate_tts", self.base_url))
            .map_err(|e| TtsError::Config(format!("invalid TTS base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("q", chunk)
            .append_pair("tl", &self.lang)
            .append_pair("client", "tw-ob")
            .append_pair("total", &total.to_string())
            .append_pair("idx", &index.to_string())
            .append_pair("textlen", &chunk.chars().count().to_string())
            .append_pair("ttsspeed", if self.slow { "0.3" } else { "1" });

        Ok(url)
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, TtsError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let url = self.chunk_url(chunk, index, chunks.len())?;
            debug!("Google TTS chunk {}/{}: {:?}", index + 1, chunks.len(), chunk);

            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(TtsError::Status { status, body });
            }

            let bytes = response.bytes().await?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        Ok(SpeechAudio::mp3(audio, self.name()))
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Split text into chunks of at most `max_chars` characters
///
/// Breaks after punctuation first, then between words. A single word longer
/// than `max_chars` is cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for segment in text.split_inclusive(SENTENCE_PUNCTUATION) {
        let mut current = String::new();

        for word in segment.split_whitespace() {
            let mut word = word.to_string();

            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                chunks.push(head);
            }

            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks.retain(|c| c.chars().any(|ch| ch.is_alphanumeric()));
    chunks
}
