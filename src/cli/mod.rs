// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod describe;
pub mod media;
pub mod models;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::vision::{InferenceAdapter, VisionModelManager};

/// Vision2Lang command-line client
#[derive(Parser, Debug)]
#[command(name = "vision2lang-cli")]
#[command(version)]
#[command(about = "Caption images, ask questions about them and synthesize speech", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "VISION2LANG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Execution device (auto, cuda, coreml, cpu)
    #[arg(long, global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Caption one or more images
    Caption(describe::CaptionArgs),

    /// Ask questions about an image
    Ask(describe::AskArgs),

    /// Synthesize speech to a file
    Speak(media::SpeakArgs),

    /// Grab a frame from the server webcam
    Capture(media::CaptureArgs),

    /// Inspect or fetch the BLIP models
    #[command(subcommand)]
    Models(models::ModelsCommand),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.device.as_deref())?;

    match cli.command {
        Commands::Caption(args) => describe::caption(&config, args).await,
        Commands::Ask(args) => describe::ask(&config, args).await,
        Commands::Speak(args) => media::speak(&config, args).await,
        Commands::Capture(args) => media::capture(&config, args).await,
        Commands::Models(command) => models::run(&config, command).await,
    }
}

/// Layered configuration with the global flag overrides applied
pub fn load_config(path: Option<&std::path::Path>, device: Option<&str>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    if let Some(device) = device {
        config.inference.device = device.to_string();
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

pub(crate) fn build_adapter(config: &AppConfig) -> InferenceAdapter {
    let manager = Arc::new(VisionModelManager::new(
        config.models.clone(),
        config.device_preference(),
    ));
    InferenceAdapter::new(manager).with_default_max_length(config.inference.max_length)
}
