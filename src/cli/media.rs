// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `speak` and `capture` commands

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::build_adapter;
use crate::config::AppConfig;
use crate::tts::SpeechService;
use crate::vision::image_utils::save_image;
use crate::webcam::default_source;

#[derive(Args, Debug)]
pub struct SpeakArgs {
    /// Text to speak
    pub text: String,

    /// Output MP3 file
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Where to save the frame
    #[arg(long)]
    pub out: PathBuf,

    /// Also caption the frame
    #[arg(long)]
    pub caption: bool,

    #[arg(long)]
    pub max_length: Option<usize>,
}

pub async fn speak(config: &AppConfig, args: SpeakArgs) -> Result<()> {
    let speech = SpeechService::from_config(&config.tts)?;
    let audio = speech.synthesize(&args.text).await?;
    audio.save_to(&args.out)?;
    println!(
        "🔊 Wrote {} bytes to {} ({})",
        audio.len(),
        args.out.display(),
        audio.backend
    );
    Ok(())
}

pub async fn capture(config: &AppConfig, args: CaptureArgs) -> Result<()> {
    let source = default_source(&config.webcam);
    let frame = source.capture().await?;

    let file_name = args
        .out
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("--out must name a file"))?;
    let directory = args
        .out
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let saved = save_image(&frame.image, &directory, file_name)
        .with_context(|| format!("Failed to save frame to {}", args.out.display()))?;
    println!(
        "📸 Captured {}x{} from {} -> {}",
        frame.width,
        frame.height,
        frame.source,
        saved.display()
    );

    if args.caption {
        let adapter = build_adapter(config);
        let generation = adapter.caption(&frame.image, args.max_length).await?;
        println!("{}", generation.text);
    }
    Ok(())
}
