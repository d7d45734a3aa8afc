// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Where each task's model files come from

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CAPTION_MODEL_ID: &str = "Xenova/blip-image-captioning-base";
pub const DEFAULT_VQA_MODEL_ID: &str = "Xenova/blip-vqa-base";
pub const DEFAULT_REVISION: &str = "main";

/// Hub repository (or local directory) holding a BLIP ONNX export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSourceConfig {
    /// Hugging Face repository id
    pub model_id: String,
    pub revision: String,
    /// Read files from here instead of the hub when the directory exists
    pub local_dir: Option<PathBuf>,
    pub vision_encoder_file: String,
    /// Only the VQA export carries a question encoder
    pub question_encoder_file: Option<String>,
    pub text_decoder_file: String,
    pub tokenizer_file: String,
}

impl ModelSourceConfig {
    pub fn caption() -> Self {
        Self {
            model_id: DEFAULT_CAPTION_MODEL_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            local_dir: None,
            vision_encoder_file: "onnx/vision_model.onnx".to_string(),
            question_encoder_file: None,
            text_decoder_file: "onnx/text_decoder_model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
        }
    }

    pub fn vqa() -> Self {
        Self {
            model_id: DEFAULT_VQA_MODEL_ID.to_string(),
            question_encoder_file: Some("onnx/text_model.onnx".to_string()),
            ..Self::caption()
        }
    }

    /// Every file this source needs, relative to the repository root
    pub fn required_files(&self) -> Vec<&str> {
        let mut files = vec![self.vision_encoder_file.as_str()];
        if let Some(question) = &self.question_encoder_file {
            files.push(question.as_str());
        }
        files.push(self.text_decoder_file.as_str());
        files.push(self.tokenizer_file.as_str());
        files
    }

    pub fn validate(&self, label: &str) -> Result<(), String> {
        if self.model_id.trim().is_empty() {
            return Err(format!("{} model id must not be empty", label));
        }
        if self.revision.trim().is_empty() {
            return Err(format!("{} model revision must not be empty", label));
        }
        if self.required_files().iter().any(|f| f.trim().is_empty()) {
            return Err(format!("{} model file names must not be empty", label));
        }
        Ok(())
    }
}

/// Partial model source as written in a config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSourceOverrides {
    pub model_id: Option<String>,
    pub revision: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub vision_encoder_file: Option<String>,
    pub question_encoder_file: Option<String>,
    pub text_decoder_file: Option<String>,
    pub tokenizer_file: Option<String>,
}

impl ModelSourceOverrides {
    pub fn apply(&self, source: &mut ModelSourceConfig) {
        if let Some(model_id) = &self.model_id {
            source.model_id = model_id.clone();
        }
        if let Some(revision) = &self.revision {
            source.revision = revision.clone();
        }
        if let Some(local_dir) = &self.local_dir {
            source.local_dir = Some(local_dir.clone());
        }
        if let Some(file) = &self.vision_encoder_file {
            source.vision_encoder_file = file.clone();
        }
        if let Some(file) = &self.question_encoder_file {
            source.question_encoder_file = Some(file.clone());
        }
        if let Some(file) = &self.text_decoder_file {
            source.text_decoder_file = file.clone();
        }
        if let Some(file) = &self.tokenizer_file {
            source.tokenizer_file = file.clone();
        }
    }
}

/// Model sources for both tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelsConfig {
    pub caption: ModelSourceConfig,
    pub vqa: ModelSourceConfig,
    /// Overrides the hf-hub cache location
    pub cache_dir: Option<PathBuf>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            caption: ModelSourceConfig::caption(),
            vqa: ModelSourceConfig::vqa(),
            cache_dir: None,
        }
    }
}
