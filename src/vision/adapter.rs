// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference adapter: validated caption and answer calls over the cached models

use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::device::ExecutionDevice;
use super::errors::VisionError;
use super::image_utils::prepare_image;
use super::model_manager::{VisionModelManager, VisionTask};
use crate::config::{validate_max_length, DEFAULT_MAX_LENGTH};

/// Text produced by one inference call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub text: String,
    pub task: VisionTask,
    pub model_id: String,
    pub device: ExecutionDevice,
    pub processing_time_ms: u64,
}

/// Runs captioning and question answering off the async executor
#[derive(Clone)]
pub struct InferenceAdapter {
    manager: Arc<VisionModelManager>,
    default_max_length: usize,
}

impl InferenceAdapter {
    pub fn new(manager: Arc<VisionModelManager>) -> Self {
        Self {
            manager,
            default_max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Bound used when a request does not name one
    pub fn with_default_max_length(mut self, max_length: usize) -> Self {
        self.default_max_length = max_length;
        self
    }

    pub fn manager(&self) -> &Arc<VisionModelManager> {
        &self.manager
    }

    pub fn default_max_length(&self) -> usize {
        self.default_max_length
    }

    /// Describe an image
    pub async fn caption(
        &self,
        image: &DynamicImage,
        max_length: Option<usize>,
    ) -> Result<Generation, VisionError> {
        self.run(VisionTask::Caption, image, None, max_length).await
    }

    /// Answer a question about an image
    ///
    /// Empty or whitespace-only questions are rejected before any model is
    /// loaded.
    pub async fn answer(
        &self,
        image: &DynamicImage,
        question: &str,
        max_length: Option<usize>,
    ) -> Result<Generation, VisionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VisionError::invalid_input(
                "question",
                "Please enter a question.",
            ));
        }

        self.run(VisionTask::Vqa, image, Some(question.to_string()), max_length)
            .await
    }

    async fn run(
        &self,
        task: VisionTask,
        image: &DynamicImage,
        question: Option<String>,
        max_length: Option<usize>,
    ) -> Result<Generation, VisionError> {
        let max_length = max_length.unwrap_or(self.default_max_length);
        validate_max_length(max_length)
            .map_err(|message| VisionError::invalid_input("maxLength", message))?;

        let rgb = prepare_image(image)?;
        let handle = self.manager.get_model(task).await?;
        let model = handle.model();

        let start = Instant::now();
        debug!(
            "Running {} on {}x{} image (max_length={})",
            task,
            rgb.width(),
            rgb.height(),
            max_length
        );

        let text = tokio::task::spawn_blocking(move || {
            model.generate(&rgb, question.as_deref(), max_length)
        })
        .await
        .map_err(|e| VisionError::Inference(format!("Inference task failed: {}", e)))?
        .map_err(|e| VisionError::Inference(format!("{:#}", e)))?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(VisionError::EmptyOutput(
                match task {
                    VisionTask::Caption => "caption",
                    VisionTask::Vqa => "answer",
                }
                .to_string(),
            ));
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!("✅ {} ({}ms): {}", task, processing_time_ms, text);

        Ok(Generation {
            text,
            task,
            model_id: handle.model_id.clone(),
            device: handle.device,
            processing_time_ms,
        })
    }
}
