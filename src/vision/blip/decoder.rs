// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP text decoder and greedy generation
//!
//! The decoder export has no key/value cache inputs, so each step re-runs
//! the whole prefix. Sequences are short enough for this to be acceptable.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, IxDyn};
use ort::session::Session;
use ort::value::{DynValue, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{input_names, lock_session};
use crate::vision::device::{build_session, ExecutionDevice};
use crate::vision::errors::LoadError;

/// Greedy decoding from `start` until `eos` or `max_length` tokens
///
/// `max_length` counts the start token and an emitted `eos`, matching the
/// `max_length` generation argument of the Hugging Face models.
/// `next_logits` receives the sequence so far and returns logits for the
/// next position.
pub fn greedy_decode<F>(start: u32, eos: u32, max_length: usize, mut next_logits: F) -> Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
{
    let mut tokens = vec![start];

    while tokens.len() < max_length {
        let logits = next_logits(&tokens)?;
        let next = argmax(&logits).ok_or_else(|| anyhow::anyhow!("Decoder returned no logits"))?;
        tokens.push(next);

        if next == eos {
            debug!("Generation stopped at EOS after {} tokens", tokens.len());
            break;
        }
    }

    Ok(tokens)
}

fn argmax(logits: &[f32]) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx as u32)
}

/// BLIP causal text decoder session
#[derive(Clone)]
pub struct BlipTextDecoder {
    session: Arc<Mutex<Session>>,
    input_names: Vec<String>,
}

impl std::fmt::Debug for BlipTextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipTextDecoder")
            .field("input_names", &self.input_names)
            .finish_non_exhaustive()
    }
}

impl BlipTextDecoder {
    pub fn load(model_path: &Path, device: ExecutionDevice) -> Result<Self, LoadError> {
        let session = build_session(model_path, device)?;
        let input_names = input_names(&session);
        debug!("Text decoder inputs: {:?}", input_names);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_names,
        })
    }

    /// Generate token ids conditioned on `encoder_hidden_states`
    pub fn generate(
        &self,
        encoder_hidden_states: &Array3<f32>,
        start: u32,
        eos: u32,
        max_length: usize,
    ) -> Result<Vec<u32>> {
        let encoder_mask = Array2::<i64>::ones((1, encoder_hidden_states.shape()[1]));
        greedy_decode(start, eos, max_length, |tokens| {
            self.next_token_logits(tokens, encoder_hidden_states, &encoder_mask)
        })
    }

    /// Logits for the position after `tokens`
    fn next_token_logits(
        &self,
        tokens: &[u32],
        encoder_hidden_states: &Array3<f32>,
        encoder_attention_mask: &Array2<i64>,
    ) -> Result<Vec<f32>> {
        let len = tokens.len();
        let input_ids = Array2::from_shape_vec(
            (1, len),
            tokens.iter().map(|&t| t as i64).collect(),
        )
        .context("Failed to shape input_ids")?;
        let attention_mask = Array2::<i64>::ones((1, len));

        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(self.input_names.len());
        for name in &self.input_names {
            let value = match name.as_str() {
                "input_ids" => Value::from_array(input_ids.clone())?.into_dyn(),
                "attention_mask" => Value::from_array(attention_mask.clone())?.into_dyn(),
                "encoder_hidden_states" => {
                    Value::from_array(encoder_hidden_states.clone())?.into_dyn()
                }
                "encoder_attention_mask" => {
                    Value::from_array(encoder_attention_mask.clone())?.into_dyn()
                }
                other => anyhow::bail!("Unexpected text decoder input: {}", other),
            };
            inputs.push((name.clone(), value));
        }

        let mut session = lock_session(&self.session)?;
        let outputs = session.run(inputs).context("Text decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits")?;

        let shape = logits.shape().to_vec();
        if shape.len() != 3 || shape[1] == 0 {
            anyhow::bail!("Unexpected logits shape: {:?}", shape);
        }

        let last = shape[1] - 1;
        let vocab = shape[2];
        Ok((0..vocab).map(|v| logits[IxDyn(&[0, last, v])]).collect())
    }
}
