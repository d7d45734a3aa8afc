// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP question encoder (VQA)
//!
//! Encodes question tokens with cross-attention over the image embeddings.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Ix3};
use ort::session::Session;
use ort::value::{DynValue, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{input_names, lock_session};
use crate::vision::device::{build_session, ExecutionDevice};
use crate::vision::errors::LoadError;

#[derive(Clone)]
pub struct BlipQuestionEncoder {
    session: Arc<Mutex<Session>>,
    input_names: Vec<String>,
}

impl std::fmt::Debug for BlipQuestionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipQuestionEncoder")
            .field("input_names", &self.input_names)
            .finish_non_exhaustive()
    }
}

impl BlipQuestionEncoder {
    pub fn load(model_path: &Path, device: ExecutionDevice) -> Result<Self, LoadError> {
        let session = build_session(model_path, device)?;
        let input_names = input_names(&session);
        debug!("Question encoder inputs: {:?}", input_names);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_names,
        })
    }

    /// Encode `[CLS] question [SEP]` against the image
    ///
    /// Returns question embeddings [1, question_len, hidden].
    pub fn encode(
        &self,
        input_ids: &Array2<i64>,
        attention_mask: &Array2<i64>,
        image_embeddings: &Array3<f32>,
    ) -> Result<Array3<f32>> {
        let image_mask = Array2::<i64>::ones((1, image_embeddings.shape()[1]));

        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(self.input_names.len());
        for name in &self.input_names {
            let value = match name.as_str() {
                "input_ids" => Value::from_array(input_ids.clone())?.into_dyn(),
                "attention_mask" => Value::from_array(attention_mask.clone())?.into_dyn(),
                "encoder_hidden_states" => {
                    Value::from_array(image_embeddings.clone())?.into_dyn()
                }
                "encoder_attention_mask" => Value::from_array(image_mask.clone())?.into_dyn(),
                other => anyhow::bail!("Unexpected question encoder input: {}", other),
            };
            inputs.push((name.clone(), value));
        }

        let mut session = lock_session(&self.session)?;
        let outputs = session
            .run(inputs)
            .context("Question encoder inference failed")?;

        let embeddings = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract question embeddings")?
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Question embeddings are not 3-dimensional")?;

        debug!("Question embeddings shape: {:?}", embeddings.shape());
        Ok(embeddings)
    }
}
