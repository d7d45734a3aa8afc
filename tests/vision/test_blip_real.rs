// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end BLIP runs against the real ONNX exports
//!
//! Downloads both models from the Hugging Face hub on first run.
//! Run with: cargo test --test vision_tests -- --ignored

use image::DynamicImage;
use std::sync::Arc;
use vision2lang::config::ModelsConfig;
use vision2lang::vision::{DevicePreference, InferenceAdapter, VisionModelManager};

const RED_CAR_IMAGE: &str = "tests/fixtures/red_car.jpg";

/// The photo is not checked in; see tests/fixtures/README.md
fn load_red_car() -> Option<DynamicImage> {
    match image::open(RED_CAR_IMAGE) {
        Ok(image) => Some(image),
        Err(e) => {
            eprintln!("Skipping: {} not available ({})", RED_CAR_IMAGE, e);
            None
        }
    }
}

fn real_adapter() -> InferenceAdapter {
    let manager = Arc::new(VisionModelManager::new(
        ModelsConfig::default(),
        DevicePreference::Auto,
    ));
    InferenceAdapter::new(manager)
}

#[tokio::test]
#[ignore = "downloads BLIP models"]
async fn test_real_caption_mentions_car() {
    let Some(image) = load_red_car() else {
        return;
    };
    let adapter = real_adapter();

    let generation = adapter.caption(&image, Some(30)).await.unwrap();
    println!("Caption: {}", generation.text);
    assert!(generation.text.to_lowercase().contains("car"));
}

#[tokio::test]
#[ignore = "downloads BLIP models"]
async fn test_real_answer_color() {
    let Some(image) = load_red_car() else {
        return;
    };
    let adapter = real_adapter();

    let generation = adapter
        .answer(&image, "what color is the car?", Some(10))
        .await
        .unwrap();
    println!("Answer: {}", generation.text);
    assert!(generation.text.to_lowercase().contains("red"));
}
