// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Execution device selection and ONNX session construction
//!
//! Accelerator sessions are built with `error_on_failure` so that a provider
//! that cannot host the graph is reported instead of silently running on CPU.
//! The model manager decides whether to retry on CPU.

use anyhow::Context;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::errors::LoadError;

/// Intra-op threads per session
pub const INTRA_THREADS: usize = 4;

/// Which device the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cuda,
    #[serde(alias = "mps")]
    CoreMl,
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cuda" | "gpu" => Ok(DevicePreference::Cuda),
            "coreml" | "mps" => Ok(DevicePreference::CoreMl),
            "cpu" => Ok(DevicePreference::Cpu),
            other => Err(format!(
                "unknown device '{}' (expected auto, cuda, coreml or cpu)",
                other
            )),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cuda => "cuda",
            DevicePreference::CoreMl => "coreml",
            DevicePreference::Cpu => "cpu",
        };
        f.write_str(name)
    }
}

/// The device a session actually runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionDevice {
    Cuda,
    CoreMl,
    Cpu,
}

impl ExecutionDevice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionDevice::Cuda => "cuda",
            ExecutionDevice::CoreMl => "coreml",
            ExecutionDevice::Cpu => "cpu",
        }
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, ExecutionDevice::Cpu)
    }
}

impl fmt::Display for ExecutionDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a preference to a concrete device
///
/// `Auto` probes CUDA, then CoreML (macOS builds with the `coreml` feature),
/// then settles on CPU.
pub fn select_device(preference: DevicePreference) -> ExecutionDevice {
    match preference {
        DevicePreference::Cuda => ExecutionDevice::Cuda,
        DevicePreference::CoreMl => ExecutionDevice::CoreMl,
        DevicePreference::Cpu => ExecutionDevice::Cpu,
        DevicePreference::Auto => {
            if cuda_available() {
                ExecutionDevice::Cuda
            } else if coreml_available() {
                ExecutionDevice::CoreMl
            } else {
                ExecutionDevice::Cpu
            }
        }
    }
}

fn cuda_available() -> bool {
    let available = CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false);
    debug!("CUDA execution provider available: {}", available);
    available
}

#[cfg(all(feature = "coreml", target_os = "macos"))]
fn coreml_available() -> bool {
    use ort::execution_providers::CoreMLExecutionProvider;
    CoreMLExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

#[cfg(not(all(feature = "coreml", target_os = "macos")))]
fn coreml_available() -> bool {
    false
}

/// Build an optimised session for `model_path` on `device`
///
/// Errors on an accelerator are classified as [`LoadError::Device`]; on CPU
/// they are [`LoadError::Session`].
pub fn build_session(model_path: &Path, device: ExecutionDevice) -> Result<Session, LoadError> {
    if !model_path.exists() {
        return Err(LoadError::MissingFile(model_path.display().to_string()));
    }

    info!(
        "Building {} session for {}",
        device,
        model_path.display()
    );

    commit_session(model_path, device).map_err(|e| {
        let message = format!("{:#}", e);
        if device.is_accelerator() {
            LoadError::Device {
                device: device.to_string(),
                message,
            }
        } else {
            LoadError::Session {
                path: model_path.display().to_string(),
                message,
            }
        }
    })
}

fn commit_session(model_path: &Path, device: ExecutionDevice) -> anyhow::Result<Session> {
    let builder = Session::builder().context("Failed to create session builder")?;

    let builder = match device {
        ExecutionDevice::Cuda => builder
            .with_execution_providers([CUDAExecutionProvider::default().build().error_on_failure()])
            .context("Failed to set CUDA execution provider")?,
        ExecutionDevice::CoreMl => with_coreml(builder)?,
        ExecutionDevice::Cpu => builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?,
    };

    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(INTRA_THREADS)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!("Failed to load ONNX model from {}", model_path.display()))
}

#[cfg(feature = "coreml")]
fn with_coreml(
    builder: ort::session::builder::SessionBuilder,
) -> anyhow::Result<ort::session::builder::SessionBuilder> {
    use ort::execution_providers::CoreMLExecutionProvider;
    builder
        .with_execution_providers([CoreMLExecutionProvider::default().build().error_on_failure()])
        .context("Failed to set CoreML execution provider")
}

#[cfg(not(feature = "coreml"))]
fn with_coreml(
    _builder: ort::session::builder::SessionBuilder,
) -> anyhow::Result<ort::session::builder::SessionBuilder> {
    anyhow::bail!("this build does not include the CoreML execution provider")
}
