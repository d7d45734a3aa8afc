// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vision2lang::api::{start_server, AppState};
use vision2lang::config::AppConfig;
use vision2lang::tts::SpeechService;
use vision2lang::version;
use vision2lang::vision::{InferenceAdapter, VisionModelManager};
use vision2lang::webcam::default_source;
use vision2lang::workflows::Workflows;

/// Vision2Lang web server
#[derive(Parser, Debug)]
#[command(name = "vision2lang", version, about)]
struct ServeArgs {
    /// TOML configuration file
    #[arg(long, env = "VISION2LANG_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "VISION2LANG_HOST")]
    host: Option<String>,

    #[arg(long, env = "VISION2LANG_PORT")]
    port: Option<u16>,

    /// Execution device (auto, cuda, coreml, cpu)
    #[arg(long, env = "VISION2LANG_DEVICE")]
    device: Option<String>,

    /// Default generation bound in tokens
    #[arg(long, env = "VISION2LANG_MAX_LENGTH")]
    max_length: Option<usize>,

    /// Directory with example images
    #[arg(long, env = "VISION2LANG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Speech backend (google, openai, none)
    #[arg(long, env = "TTS_PROVIDER")]
    tts_provider: Option<String>,

    /// Load both models before accepting requests
    #[arg(long)]
    preload: bool,
}

impl ServeArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(device) = &self.device {
            config.inference.device = device.clone();
        }
        if let Some(max_length) = self.max_length {
            config.inference.max_length = max_length;
        }
        if let Some(data_dir) = &self.data_dir {
            config.server.data_dir = data_dir.clone();
        }
        if let Some(provider) = &self.tts_provider {
            config.tts.provider = provider.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = ServeArgs::parse();
    tracing::info!("{}", version::get_version_string());

    println!("🚀 Starting Vision2Lang...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    println!("🧠 Initializing vision models...");
    let preference = config.device_preference();
    let manager = Arc::new(VisionModelManager::new(config.models.clone(), preference));
    println!("   Device preference: {}", preference);
    println!("   Caption model: {}", config.models.caption.model_id);
    println!("   VQA model: {}", config.models.vqa.model_id);

    if args.preload {
        match manager.preload().await {
            Ok(handles) => {
                for handle in handles {
                    println!("✅ {} model loaded on {}", handle.task, handle.device);
                }
            }
            Err(e) => {
                eprintln!("❌ Failed to preload models: {}", e);
                eprintln!("   The server will start and retry on the first request.");
            }
        }
    } else {
        println!("   Models load on first use (pass --preload to load now)");
    }

    let adapter = InferenceAdapter::new(manager).with_default_max_length(config.inference.max_length);

    let speech = match SpeechService::from_config(&config.tts) {
        Ok(speech) => speech,
        Err(e) => {
            eprintln!("⚠️  Text-to-speech disabled: {}", e);
            SpeechService::disabled()
        }
    };
    match speech.backend() {
        Some(backend) => println!("🔊 Text-to-speech: {}", backend),
        None => println!("🔇 Text-to-speech: disabled"),
    }

    let frames = default_source(&config.webcam);
    println!("📸 Server webcam: {}", frames.name());

    let workflows = Workflows::new(adapter, speech, frames);
    let state = AppState::new(workflows, config.server.data_dir.clone());

    println!("\n🌐 Starting API server on http://{}", config.bind_address());
    println!("   GET  /                    (web UI)");
    println!("   GET  /health");
    println!("   GET  /v1/models");
    println!("   POST /v1/caption          POST /v1/caption/upload");
    println!("   POST /v1/vqa              POST /v1/vqa/upload");
    println!("   POST /v1/webcam");
    println!("   POST /v1/speak");
    println!("   GET  /v1/examples         GET  /v1/examples/:name");
    println!();

    start_server(&config, state).await
}
