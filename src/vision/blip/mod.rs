// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP image captioning and visual question answering over ONNX Runtime
//!
//! Consumes ONNX exports of the BLIP base checkpoints:
//! - `vision_model.onnx`: pixel values to image embeddings
//! - `text_model.onnx`: question encoder (VQA only)
//! - `text_decoder_model.onnx`: causal text decoder producing logits
//! - `tokenizer.json`: BERT WordPiece vocabulary with the `[DEC]` token

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;
pub mod question_encoder;

pub use decoder::{greedy_decode, BlipTextDecoder};
pub use encoder::BlipVisionEncoder;
pub use model::BlipModel;
pub use preprocessing::{preprocess_for_blip, BLIP_INPUT_SIZE};
pub use question_encoder::BlipQuestionEncoder;

use ort::session::Session;
use std::sync::{Arc, Mutex, MutexGuard};

/// `[DEC]`, the decoder start token
pub const DEC_TOKEN_ID: u32 = 30522;

/// `[SEP]`, ends generation
pub const SEP_TOKEN_ID: u32 = 102;

/// `[PAD]`
pub const PAD_TOKEN_ID: u32 = 0;

pub(crate) fn lock_session(
    session: &Arc<Mutex<Session>>,
) -> anyhow::Result<MutexGuard<'_, Session>> {
    session
        .lock()
        .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))
}

pub(crate) fn input_names(session: &Session) -> Vec<String> {
    session.inputs.iter().map(|i| i.name.clone()).collect()
}
