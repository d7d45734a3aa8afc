// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Complete BLIP pipeline: preprocessing, encoders, decoder, tokenizer

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::decoder::BlipTextDecoder;
use super::encoder::BlipVisionEncoder;
use super::preprocessing::preprocess_for_blip;
use super::question_encoder::BlipQuestionEncoder;
use super::{DEC_TOKEN_ID, PAD_TOKEN_ID, SEP_TOKEN_ID};
use crate::vision::device::ExecutionDevice;
use crate::vision::errors::LoadError;
use crate::vision::hub::ModelFiles;
use crate::vision::model_manager::VisionLanguageModel;

/// BLIP's text position limit; longer questions are cut to fit
pub const MAX_QUESTION_TOKENS: usize = 512;

/// Load the tokenizer with encodings truncated to `max_tokens`
pub(crate) fn load_tokenizer(path: &Path, max_tokens: usize) -> Result<Tokenizer, LoadError> {
    let tokenizer_error = |message: String| LoadError::Tokenizer {
        path: path.display().to_string(),
        message,
    };

    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| tokenizer_error(e.to_string()))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_tokens,
            ..Default::default()
        }))
        .map_err(|e| tokenizer_error(e.to_string()))?;
    Ok(tokenizer)
}

/// A loaded BLIP checkpoint
///
/// Captioning checkpoints have no question encoder; VQA checkpoints do.
#[derive(Clone)]
pub struct BlipModel {
    encoder: BlipVisionEncoder,
    question_encoder: Option<BlipQuestionEncoder>,
    decoder: BlipTextDecoder,
    tokenizer: Arc<Tokenizer>,
    device: ExecutionDevice,
}

impl std::fmt::Debug for BlipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipModel")
            .field("encoder", &self.encoder)
            .field("question_encoder", &self.question_encoder)
            .field("decoder", &self.decoder)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl BlipModel {
    /// Build every session on `device`
    pub fn load(files: &ModelFiles, device: ExecutionDevice) -> Result<Self, LoadError> {
        let start = Instant::now();

        let tokenizer = load_tokenizer(&files.tokenizer, MAX_QUESTION_TOKENS)?;

        let encoder = BlipVisionEncoder::load(&files.vision_encoder, device)?;
        let question_encoder = files
            .question_encoder
            .as_deref()
            .map(|path| BlipQuestionEncoder::load(path, device))
            .transpose()?;
        let decoder = BlipTextDecoder::load(&files.text_decoder, device)?;

        info!(
            "✅ BLIP model loaded on {} in {}ms (question encoder: {})",
            device,
            start.elapsed().as_millis(),
            question_encoder.is_some()
        );

        Ok(Self {
            encoder,
            question_encoder,
            decoder,
            tokenizer: Arc::new(tokenizer),
            device,
        })
    }

    pub fn device(&self) -> ExecutionDevice {
        self.device
    }

    pub fn supports_questions(&self) -> bool {
        self.question_encoder.is_some()
    }

    /// Unconditional caption
    pub fn caption(&self, image: &DynamicImage, max_length: usize) -> Result<String> {
        let pixel_values = preprocess_for_blip(image);
        let image_embeddings = self.encoder.encode(&pixel_values)?;

        let tokens = self
            .decoder
            .generate(&image_embeddings, DEC_TOKEN_ID, SEP_TOKEN_ID, max_length)?;
        self.decode(&tokens)
    }

    /// Answer a free-text question about the image
    pub fn answer(&self, image: &DynamicImage, question: &str, max_length: usize) -> Result<String> {
        let question_encoder = self
            .question_encoder
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("This model cannot answer questions"))?;

        let pixel_values = preprocess_for_blip(image);
        let image_embeddings = self.encoder.encode(&pixel_values)?;

        let encoding = self
            .tokenizer
            .encode(question, true)
            .map_err(|e| anyhow::anyhow!("Failed to tokenize question: {}", e))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        debug!("Question tokenized to {} tokens", ids.len());

        let len = ids.len();
        let input_ids = Array2::from_shape_vec((1, len), ids).context("Failed to shape question ids")?;
        let attention_mask =
            Array2::from_shape_vec((1, len), mask).context("Failed to shape question mask")?;

        let question_embeddings =
            question_encoder.encode(&input_ids, &attention_mask, &image_embeddings)?;

        let tokens = self
            .decoder
            .generate(&question_embeddings, DEC_TOKEN_ID, SEP_TOKEN_ID, max_length)?;
        self.decode(&tokens)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let content: Vec<u32> = tokens
            .iter()
            .copied()
            .filter(|&t| t != DEC_TOKEN_ID && t != SEP_TOKEN_ID && t != PAD_TOKEN_ID)
            .collect();

        let text = self
            .tokenizer
            .decode(&content, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        Ok(text.trim().to_string())
    }
}

impl VisionLanguageModel for BlipModel {
    fn generate(
        &self,
        image: &DynamicImage,
        question: Option<&str>,
        max_length: usize,
    ) -> Result<String> {
        match question {
            Some(question) => self.answer(image, question, max_length),
            None => self.caption(image, max_length),
        }
    }

    fn device(&self) -> ExecutionDevice {
        self.device
    }
}
