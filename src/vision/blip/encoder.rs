// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP vision encoder
//!
//! Turns a preprocessed image into patch embeddings that the text
//! components attend to.

use anyhow::{Context, Result};
use ndarray::{Array3, Array4, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock_session;
use super::preprocessing::BLIP_INPUT_SIZE;
use crate::vision::device::{build_session, ExecutionDevice};
use crate::vision::errors::LoadError;

/// BLIP vision transformer session
#[derive(Clone)]
pub struct BlipVisionEncoder {
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for BlipVisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipVisionEncoder")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl BlipVisionEncoder {
    pub fn load(model_path: &Path, device: ExecutionDevice) -> Result<Self, LoadError> {
        let session = build_session(model_path, device)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("Vision encoder input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Encode pixel values [1, 3, 384, 384] into embeddings [1, seq_len, hidden]
    pub fn encode(&self, pixel_values: &Array4<f32>) -> Result<Array3<f32>> {
        let shape = pixel_values.shape();
        let size = BLIP_INPUT_SIZE as usize;
        if shape != [1, 3, size, size] {
            anyhow::bail!(
                "Invalid pixel_values shape: {:?}, expected [1, 3, {}, {}]",
                shape,
                size,
                size
            );
        }

        let input_value = Value::from_array(pixel_values.to_owned())
            .context("Failed to create pixel_values tensor")?;

        let mut session = lock_session(&self.session)?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Vision encoder inference failed")?;

        let embeddings = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract image embeddings")?
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Image embeddings are not 3-dimensional")?;

        debug!("Image embeddings shape: {:?}", embeddings.shape());
        Ok(embeddings)
    }
}
