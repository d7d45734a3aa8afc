// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod tts;
pub mod version;
pub mod vision;
pub mod webcam;
pub mod workflows;

// Re-export main types
pub use config::AppConfig;
pub use tts::{SpeechAudio, SpeechService, SpeechSynthesizer, TtsError, TtsProvider};
pub use vision::{
    DevicePreference, ExecutionDevice, Generation, InferenceAdapter, LoadError, ModelHandle,
    VisionError, VisionModelManager, VisionTask,
};
pub use webcam::{CaptureError, CapturedFrame, FrameSource};
pub use workflows::{WorkflowOutput, Workflows};
