// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! The three user-facing workflows: caption, question answering, webcam
//!
//! Each produces text and, when requested, speech. Speech failures never
//! fail a workflow.

use image::DynamicImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::tts::{SpeechAudio, SpeechService};
use crate::vision::{Generation, InferenceAdapter, VisionError};
use crate::webcam::{CaptureError, CapturedFrame, FrameSource};

/// Result of one workflow run
#[derive(Debug, Clone)]
pub struct WorkflowOutput {
    pub generation: Generation,
    pub audio: Option<SpeechAudio>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Vision(#[from] VisionError),
}

#[derive(Clone)]
pub struct Workflows {
    adapter: InferenceAdapter,
    speech: SpeechService,
    frames: Arc<dyn FrameSource>,
}

impl Workflows {
    pub fn new(adapter: InferenceAdapter, speech: SpeechService, frames: Arc<dyn FrameSource>) -> Self {
        Self {
            adapter,
            speech,
            frames,
        }
    }

    pub fn adapter(&self) -> &InferenceAdapter {
        &self.adapter
    }

    pub fn speech(&self) -> &SpeechService {
        &self.speech
    }

    pub fn frame_source(&self) -> &Arc<dyn FrameSource> {
        &self.frames
    }

    /// Caption an image, optionally speaking the caption
    pub async fn caption_with_audio(
        &self,
        image: &DynamicImage,
        max_length: Option<usize>,
        tts: bool,
    ) -> Result<WorkflowOutput, VisionError> {
        info!("🖼️ Generating caption...");
        let generation = self.adapter.caption(image, max_length).await?;
        let audio = self.maybe_speak(&generation.text, tts).await;
        Ok(WorkflowOutput { generation, audio })
    }

    /// Answer a question about an image, optionally speaking the answer
    pub async fn answer_with_audio(
        &self,
        image: &DynamicImage,
        question: &str,
        max_length: Option<usize>,
        tts: bool,
    ) -> Result<WorkflowOutput, VisionError> {
        info!("❓ Question: {}", question.trim());
        let generation = self.adapter.answer(image, question, max_length).await?;
        let audio = self.maybe_speak(&generation.text, tts).await;
        Ok(WorkflowOutput { generation, audio })
    }

    /// Caption a webcam frame
    ///
    /// Uses `frame` when the browser supplied one, otherwise asks the
    /// server-side frame source.
    pub async fn capture_and_caption(
        &self,
        frame: Option<CapturedFrame>,
        max_length: Option<usize>,
        tts: bool,
    ) -> Result<(CapturedFrame, WorkflowOutput), WorkflowError> {
        let frame = match frame {
            Some(frame) => frame,
            None => {
                info!("📸 Capturing webcam frame from {}...", self.frames.name());
                self.frames.capture().await?
            }
        };

        let output = self.caption_with_audio(&frame.image, max_length, tts).await?;
        Ok((frame, output))
    }

    async fn maybe_speak(&self, text: &str, tts: bool) -> Option<SpeechAudio> {
        if tts {
            self.speech.speak(text).await
        } else {
            None
        }
    }
}
