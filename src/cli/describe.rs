// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `caption` and `ask` commands

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::build_adapter;
use crate::config::AppConfig;
use crate::tts::SpeechService;
use crate::vision::decode_image_bytes;
use image::DynamicImage;

/// Arguments for the caption command
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image files to caption
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Maximum caption length in tokens
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Write spoken captions here; with several images the image name is appended
    #[arg(long)]
    pub speak_to: Option<PathBuf>,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Image file
    pub image: PathBuf,

    /// One or more questions
    #[arg(required = true)]
    pub questions: Vec<String>,

    /// Maximum answer length in tokens
    #[arg(long)]
    pub max_length: Option<usize>,
}

pub async fn caption(config: &AppConfig, args: CaptionArgs) -> Result<()> {
    let adapter = build_adapter(config);
    let speech = match &args.speak_to {
        Some(_) => Some(SpeechService::from_config(&config.tts)?),
        None => None,
    };

    let total = args.images.len();
    let mut failures = 0;

    for path in &args.images {
        let result = async {
            let image = open_image(path)?;
            let generation = adapter.caption(&image, args.max_length).await?;
            println!("{}: {}", path.display(), generation.text);

            if let (Some(speech), Some(base)) = (&speech, &args.speak_to) {
                let out = speech_path(base, path, total);
                let audio = speech.synthesize(&generation.text).await?;
                audio.save_to(&out)?;
                info!("🔊 Saved speech to {}", out.display());
            }
            Ok::<_, anyhow::Error>(())
        }
        .await;

        if let Err(e) = result {
            failures += 1;
            error!("Failed to caption {}: {:#}", path.display(), e);
            eprintln!("{}: error: {:#}", path.display(), e);
        }
    }

    if failures > 0 {
        bail!("{} of {} images failed", failures, total);
    }
    Ok(())
}

pub async fn ask(config: &AppConfig, args: AskArgs) -> Result<()> {
    let adapter = build_adapter(config);
    let image = open_image(&args.image)?;

    let mut failures = 0;
    for question in &args.questions {
        println!("Q: {}", question);
        match adapter.answer(&image, question, args.max_length).await {
            Ok(generation) => println!("A: {}", generation.text),
            Err(e) => {
                failures += 1;
                eprintln!("error: {}", e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} questions failed", failures, args.questions.len());
    }
    Ok(())
}

pub(crate) fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (image, _) = decode_image_bytes(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(image)
}

/// Output file for one image's speech
///
/// A single image writes to `base` itself; batches write `<base>-<image>.mp3`.
pub fn speech_path(base: &Path, image: &Path, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let base_stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("speech");
    let image_stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    base.with_file_name(format!("{}-{}.mp3", base_stem, image_stem))
}
