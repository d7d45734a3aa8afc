// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for lazily loading and caching the BLIP models
//!
//! Each task owns a `tokio::sync::OnceCell`. The first `get_model` call for a
//! task performs the load; concurrent callers wait on the same cell and later
//! callers get the same `Arc`. A failed load leaves the cell empty so the next
//! request tries again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::blip::BlipModel;
use super::device::{select_device, DevicePreference, ExecutionDevice};
use super::errors::LoadError;
use super::hub::resolve_model_files;
use crate::config::{ModelSourceConfig, ModelsConfig};

/// The two model families the application serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionTask {
    Caption,
    Vqa,
}

impl VisionTask {
    pub const ALL: [VisionTask; 2] = [VisionTask::Caption, VisionTask::Vqa];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisionTask::Caption => "caption",
            VisionTask::Vqa => "vqa",
        }
    }
}

impl fmt::Display for VisionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model that turns an image (and optional question) into text
///
/// Implementations block; callers run them on the blocking pool.
pub trait VisionLanguageModel: Send + Sync {
    fn generate(
        &self,
        image: &DynamicImage,
        question: Option<&str>,
        max_length: usize,
    ) -> anyhow::Result<String>;

    fn device(&self) -> ExecutionDevice;
}

/// Immutable handle to a loaded model
pub struct ModelHandle {
    pub task: VisionTask,
    pub model_id: String,
    pub device: ExecutionDevice,
    pub loaded_at: DateTime<Utc>,
    model: Arc<dyn VisionLanguageModel>,
}

impl ModelHandle {
    pub fn new(task: VisionTask, model_id: impl Into<String>, model: Arc<dyn VisionLanguageModel>) -> Self {
        Self {
            task,
            model_id: model_id.into(),
            device: model.device(),
            loaded_at: Utc::now(),
            model,
        }
    }

    pub fn model(&self) -> Arc<dyn VisionLanguageModel> {
        self.model.clone()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("task", &self.task)
            .field("model_id", &self.model_id)
            .field("device", &self.device)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Fetches and builds a model for a task on a device
#[async_trait]
pub trait ModelLoader: Send + Sync {
    fn model_id(&self, task: VisionTask) -> String;

    async fn load(
        &self,
        task: VisionTask,
        device: ExecutionDevice,
    ) -> Result<Arc<dyn VisionLanguageModel>, LoadError>;
}

/// Loads BLIP ONNX exports from the hub or a local directory
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    models: ModelsConfig,
}

impl OnnxModelLoader {
    pub fn new(models: ModelsConfig) -> Self {
        Self { models }
    }

    fn source(&self, task: VisionTask) -> &ModelSourceConfig {
        match task {
            VisionTask::Caption => &self.models.caption,
            VisionTask::Vqa => &self.models.vqa,
        }
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    fn model_id(&self, task: VisionTask) -> String {
        self.source(task).model_id.clone()
    }

    async fn load(
        &self,
        task: VisionTask,
        device: ExecutionDevice,
    ) -> Result<Arc<dyn VisionLanguageModel>, LoadError> {
        let source = self.source(task).clone();
        let cache_dir = self.models.cache_dir.clone();

        let model = tokio::task::spawn_blocking(move || {
            let files = resolve_model_files(&source, cache_dir.as_deref())?;
            if task == VisionTask::Vqa && files.question_encoder.is_none() {
                return Err(LoadError::MissingFile(format!(
                    "{}: question encoder",
                    source.model_id
                )));
            }
            BlipModel::load(&files, device)
        })
        .await
        .map_err(|e| LoadError::Join(e.to_string()))??;

        Ok(Arc::new(model))
    }
}

/// Load state of one task, as reported by `list_models`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub task: VisionTask,
    pub model_id: String,
    pub loaded: bool,
    pub device: Option<ExecutionDevice>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Process-wide cache of model handles, one per task
pub struct VisionModelManager {
    loader: Arc<dyn ModelLoader>,
    preference: DevicePreference,
    caption: OnceCell<Arc<ModelHandle>>,
    vqa: OnceCell<Arc<ModelHandle>>,
}

impl VisionModelManager {
    /// Manager backed by the ONNX loader
    pub fn new(models: ModelsConfig, preference: DevicePreference) -> Self {
        Self::with_loader(Arc::new(OnnxModelLoader::new(models)), preference)
    }

    pub fn with_loader(loader: Arc<dyn ModelLoader>, preference: DevicePreference) -> Self {
        Self {
            loader,
            preference,
            caption: OnceCell::new(),
            vqa: OnceCell::new(),
        }
    }

    fn cell(&self, task: VisionTask) -> &OnceCell<Arc<ModelHandle>> {
        match task {
            VisionTask::Caption => &self.caption,
            VisionTask::Vqa => &self.vqa,
        }
    }

    /// Get the model for `task`, loading it on first use
    pub async fn get_model(&self, task: VisionTask) -> Result<Arc<ModelHandle>, LoadError> {
        self.cell(task)
            .get_or_try_init(|| self.load_handle(task))
            .await
            .cloned()
    }

    /// The cached handle, if the task has been loaded
    pub fn loaded(&self, task: VisionTask) -> Option<Arc<ModelHandle>> {
        self.cell(task).get().cloned()
    }

    async fn load_handle(&self, task: VisionTask) -> Result<Arc<ModelHandle>, LoadError> {
        let model_id = self.loader.model_id(task);
        let device = select_device(self.preference);
        info!("Loading {} model {} on {}...", task, model_id, device);

        let model = match self.loader.load(task, device).await {
            Ok(model) => model,
            Err(e) if e.is_device_failure() && device.is_accelerator() => {
                warn!("⚠️ {} model failed on {}: {}", task, device, e);
                warn!("   Retrying on CPU");
                self.loader.load(task, ExecutionDevice::Cpu).await?
            }
            Err(e) => {
                warn!("⚠️ Failed to load {} model {}: {}", task, model_id, e);
                return Err(e);
            }
        };

        let handle = ModelHandle::new(task, model_id, model);
        info!(
            "✅ {} model {} ready on {}",
            task, handle.model_id, handle.device
        );
        Ok(Arc::new(handle))
    }

    /// Status of every task
    pub fn list_models(&self) -> Vec<ModelStatus> {
        VisionTask::ALL
            .iter()
            .map(|&task| {
                let handle = self.loaded(task);
                ModelStatus {
                    task,
                    model_id: handle
                        .as_ref()
                        .map(|h| h.model_id.clone())
                        .unwrap_or_else(|| self.loader.model_id(task)),
                    loaded: handle.is_some(),
                    device: handle.as_ref().map(|h| h.device),
                    loaded_at: handle.as_ref().map(|h| h.loaded_at),
                }
            })
            .collect()
    }

    /// Load every task now instead of on first request
    ///
    /// Tasks load concurrently; handles come back in `VisionTask::ALL` order.
    pub async fn preload(&self) -> Result<Vec<Arc<ModelHandle>>, LoadError> {
        try_join_all(VisionTask::ALL.iter().map(|&task| self.get_model(task))).await
    }

    pub fn device_preference(&self) -> DevicePreference {
        self.preference
    }
}
