// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Workflow response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::webcam::CapturedFrame;
use crate::workflows::WorkflowOutput;

/// Response for caption, question answering and webcam requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponse {
    pub request_id: String,
    /// Caption or answer
    pub text: String,
    /// Base64 audio when speech was requested and succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
    pub task: String,
    /// Model id used for generation
    pub model: String,
    pub device: String,
    pub processing_time_ms: u64,
    /// Webcam mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameInfo>,
}

/// The captured webcam frame, resized for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    /// Base64 PNG
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub source: String,
}

impl WorkflowResponse {
    pub fn from_output(output: WorkflowOutput) -> Self {
        let (audio, audio_format) = match output.audio {
            Some(audio) => (Some(audio.to_base64()), Some(audio.format().to_string())),
            None => (None, None),
        };
        let generation = output.generation;

        Self {
            request_id: Uuid::new_v4().to_string(),
            text: generation.text,
            audio,
            audio_format,
            task: generation.task.to_string(),
            model: generation.model_id,
            device: generation.device.to_string(),
            processing_time_ms: generation.processing_time_ms,
            frame: None,
        }
    }

    pub fn with_frame(mut self, frame: &CapturedFrame, display_png_base64: String) -> Self {
        self.frame = Some(FrameInfo {
            image: display_png_base64,
            width: frame.width,
            height: frame.height,
            source: frame.source.clone(),
        });
        self
    }
}
