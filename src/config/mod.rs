// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `.env` and environment variables. Binaries apply command-line flags last
//! and call [`AppConfig::validate`].

pub mod models;

pub use models::{ModelSourceConfig, ModelSourceOverrides, ModelsConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::tts::TtsProvider;
use crate::vision::DevicePreference;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_MAX_LENGTH: usize = 50;
/// `max_length` counts the decoder start token, so one token leaves no room for text
pub const MIN_MAX_LENGTH: usize = 2;
pub const MAX_MAX_LENGTH: usize = 512;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "VISION2LANG_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Example images for the UI gallery; uploads are saved here too
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceConfig {
    /// auto, cuda, coreml (alias mps) or cpu
    pub device: String,
    pub max_length: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: DevicePreference::Auto.to_string(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsConfig {
    /// google, openai or none
    pub provider: String,
    pub lang: String,
    pub slow: bool,
    /// Base URL of the OpenAI-compatible speech server
    pub endpoint: Option<String>,
    pub model: String,
    pub voice: String,
    /// Base URL for the Google Translate TTS endpoint
    pub google_base_url: String,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::Google.to_string(),
            lang: "en".to_string(),
            slow: false,
            endpoint: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            google_base_url: "https://translate.google.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebcamConfig {
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Frames discarded while the sensor settles exposure
    pub warmup_frames: usize,
}

impl Default for WebcamConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            warmup_frames: 5,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub models: ModelsConfig,
    pub tts: TtsConfig,
    pub webcam: WebcamConfig,
}

/// Shape of the optional TOML file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    server: FileServer,
    inference: FileInference,
    models: FileModels,
    tts: FileTts,
    webcam: FileWebcam,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileServer {
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileInference {
    device: Option<String>,
    max_length: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileModels {
    cache_dir: Option<PathBuf>,
    caption: ModelSourceOverrides,
    vqa: ModelSourceOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileTts {
    provider: Option<String>,
    lang: Option<String>,
    slow: Option<bool>,
    endpoint: Option<String>,
    model: Option<String>,
    voice: Option<String>,
    google_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileWebcam {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    warmup_frames: Option<usize>,
}

impl AppConfig {
    /// Defaults, then the TOML file (explicit path or `VISION2LANG_CONFIG`), then env
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
        if let Some(path) = path {
            config.apply_file(&path)?;
            info!("📄 Loaded configuration from {}", path.display());
        }

        config.apply_env();
        Ok(config)
    }

    /// Merge a TOML file over the current values
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.apply_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(content)?;

        let server = file.server;
        set(&mut self.server.host, server.host);
        set(&mut self.server.port, server.port);
        set(&mut self.server.data_dir, server.data_dir);

        set(&mut self.inference.device, file.inference.device);
        set(&mut self.inference.max_length, file.inference.max_length);

        if file.models.cache_dir.is_some() {
            self.models.cache_dir = file.models.cache_dir;
        }
        file.models.caption.apply(&mut self.models.caption);
        file.models.vqa.apply(&mut self.models.vqa);

        let tts = file.tts;
        set(&mut self.tts.provider, tts.provider);
        set(&mut self.tts.lang, tts.lang);
        set(&mut self.tts.slow, tts.slow);
        if tts.endpoint.is_some() {
            self.tts.endpoint = tts.endpoint;
        }
        set(&mut self.tts.model, tts.model);
        set(&mut self.tts.voice, tts.voice);
        set(&mut self.tts.google_base_url, tts.google_base_url);
        set(&mut self.tts.timeout_secs, tts.timeout_secs);

        let webcam = file.webcam;
        set(&mut self.webcam.device, webcam.device);
        set(&mut self.webcam.width, webcam.width);
        set(&mut self.webcam.height, webcam.height);
        set(&mut self.webcam.warmup_frames, webcam.warmup_frames);

        Ok(())
    }

    /// Merge environment variables over the current values
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| env::var(key).ok());
    }

    /// Merge values from an arbitrary variable lookup
    ///
    /// Unparsable numbers are ignored so the previous layer wins.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        set(&mut self.server.host, var("VISION2LANG_HOST"));
        set(
            &mut self.server.port,
            var("VISION2LANG_PORT").and_then(|v| v.parse().ok()),
        );
        set(
            &mut self.server.data_dir,
            var("VISION2LANG_DATA_DIR").map(PathBuf::from),
        );

        set(&mut self.inference.device, var("VISION2LANG_DEVICE"));
        set(
            &mut self.inference.max_length,
            var("VISION2LANG_MAX_LENGTH").and_then(|v| v.parse().ok()),
        );

        set(&mut self.models.caption.model_id, var("CAPTION_MODEL_ID"));
        if let Some(dir) = var("CAPTION_MODEL_DIR") {
            self.models.caption.local_dir = Some(PathBuf::from(dir));
        }
        set(&mut self.models.vqa.model_id, var("VQA_MODEL_ID"));
        if let Some(dir) = var("VQA_MODEL_DIR") {
            self.models.vqa.local_dir = Some(PathBuf::from(dir));
        }

        set(&mut self.tts.provider, var("TTS_PROVIDER"));
        set(&mut self.tts.lang, var("TTS_LANG"));
        set(
            &mut self.tts.slow,
            var("TTS_SLOW").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")),
        );
        if let Some(endpoint) = var("TTS_ENDPOINT") {
            self.tts.endpoint = Some(endpoint);
        }
        set(&mut self.tts.model, var("TTS_MODEL"));
        set(&mut self.tts.voice, var("TTS_VOICE"));

        set(&mut self.webcam.device, var("WEBCAM_DEVICE"));

        debug!("Configuration after environment: {:?}", self);
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }
        if self.server.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        validate_max_length(self.inference.max_length)?;
        self.inference.device.parse::<DevicePreference>()?;

        self.models.caption.validate("caption")?;
        self.models.vqa.validate("vqa")?;
        if self.models.vqa.question_encoder_file.is_none() {
            return Err("vqa model needs a question encoder file".to_string());
        }

        let provider = self.tts.provider.parse::<TtsProvider>()?;
        if provider == TtsProvider::OpenAi
            && self.tts.endpoint.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            return Err("TTS provider 'openai' requires TTS_ENDPOINT".to_string());
        }
        if self.tts.timeout_secs == 0 {
            return Err("TTS timeout must be greater than 0".to_string());
        }

        if self.webcam.width == 0 || self.webcam.height == 0 {
            return Err("Webcam resolution must be non-zero".to_string());
        }
        Ok(())
    }

    /// Parsed device preference; `Auto` when the value is invalid
    pub fn device_preference(&self) -> DevicePreference {
        self.inference.device.parse().unwrap_or_default()
    }

    /// Parsed TTS provider; `None` when the value is invalid
    pub fn tts_provider(&self) -> TtsProvider {
        self.tts.provider.parse().unwrap_or(TtsProvider::None)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Check a requested generation bound
pub fn validate_max_length(max_length: usize) -> Result<(), String> {
    if !(MIN_MAX_LENGTH..=MAX_MAX_LENGTH).contains(&max_length) {
        return Err(format!(
            "max_length must be between {} and {}, got {}",
            MIN_MAX_LENGTH, MAX_MAX_LENGTH, max_length
        ));
    }
    Ok(())
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
