// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Locate model files on disk or download them from the Hugging Face hub

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};
use tracing::info;

use super::errors::LoadError;
use crate::config::ModelSourceConfig;

/// Absolute paths for every file one BLIP export needs
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub vision_encoder: PathBuf,
    pub question_encoder: Option<PathBuf>,
    pub text_decoder: PathBuf,
    pub tokenizer: PathBuf,
}

/// Resolve a model source to local files
///
/// A configured `local_dir` that exists wins and nothing is downloaded.
/// Otherwise files come from the hub cache, downloading on a miss. This
/// blocks, so async callers go through `spawn_blocking`.
pub fn resolve_model_files(
    source: &ModelSourceConfig,
    cache_dir: Option<&Path>,
) -> Result<ModelFiles, LoadError> {
    if let Some(dir) = source.local_dir.as_deref().filter(|d| d.is_dir()) {
        info!("📂 Using local model directory {}", dir.display());
        return resolve_local(source, dir);
    }

    resolve_from_hub(source, cache_dir)
}

fn resolve_local(source: &ModelSourceConfig, dir: &Path) -> Result<ModelFiles, LoadError> {
    let local = |name: &str| -> Result<PathBuf, LoadError> {
        let path = dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LoadError::MissingFile(path.display().to_string()))
        }
    };

    Ok(ModelFiles {
        vision_encoder: local(&source.vision_encoder_file)?,
        question_encoder: source
            .question_encoder_file
            .as_deref()
            .map(local)
            .transpose()?,
        text_decoder: local(&source.text_decoder_file)?,
        tokenizer: local(&source.tokenizer_file)?,
    })
}

fn resolve_from_hub(
    source: &ModelSourceConfig,
    cache_dir: Option<&Path>,
) -> Result<ModelFiles, LoadError> {
    let fetch_error = |file: &str, message: String| LoadError::Fetch {
        repo: source.model_id.clone(),
        file: file.to_string(),
        message,
    };

    let mut builder = ApiBuilder::new().with_progress(false);
    if let Some(cache_dir) = cache_dir {
        builder = builder.with_cache_dir(cache_dir.to_path_buf());
    }
    let api = builder
        .build()
        .map_err(|e| fetch_error("<api>", e.to_string()))?;

    let repo = api.repo(Repo::with_revision(
        source.model_id.clone(),
        RepoType::Model,
        source.revision.clone(),
    ));

    let get = |name: &str| -> Result<PathBuf, LoadError> {
        info!("⬇️  Fetching {}/{}", source.model_id, name);
        repo.get(name).map_err(|e| fetch_error(name, e.to_string()))
    };

    Ok(ModelFiles {
        vision_encoder: get(&source.vision_encoder_file)?,
        question_encoder: source
            .question_encoder_file
            .as_deref()
            .map(get)
            .transpose()?,
        text_decoder: get(&source.text_decoder_file)?,
        tokenizer: get(&source.tokenizer_file)?,
    })
}
