// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision-language inference
//!
//! This module provides:
//! - Image decoding and normalisation
//! - BLIP captioning and visual question answering on ONNX Runtime
//! - A lazily-populated model cache with CPU fallback
//! - The inference adapter used by the HTTP API and the CLI

pub mod adapter;
pub mod blip;
pub mod device;
pub mod errors;
pub mod hub;
pub mod image_utils;
pub mod model_manager;

pub use adapter::{Generation, InferenceAdapter};
pub use device::{select_device, DevicePreference, ExecutionDevice};
pub use errors::{LoadError, VisionError};
pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, prepare_image, resize_for_display,
    ImageError, ImageInfo,
};
pub use model_manager::{
    ModelHandle, ModelLoader, ModelStatus, OnnxModelLoader, VisionLanguageModel,
    VisionModelManager, VisionTask,
};
