// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption and answer through the inference adapter

use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use vision2lang::vision::{VisionError, VisionTask};

use crate::common::{adapter_with, solid_image, FakeLoader, ANSWER_TEXT, CAPTION_TEXT};

#[tokio::test]
async fn test_caption_returns_text() {
    let adapter = adapter_with(Arc::new(FakeLoader::new()));
    let generation = adapter.caption(&solid_image(64, 64), None).await.unwrap();

    assert_eq!(generation.text, CAPTION_TEXT);
    assert_eq!(generation.task, VisionTask::Caption);
    assert_eq!(generation.model_id, "fake/caption");
}

#[tokio::test]
async fn test_caption_length_bounded() {
    let adapter = adapter_with(Arc::new(FakeLoader::new())).with_default_max_length(2);

    let generation = adapter.caption(&solid_image(8, 8), None).await.unwrap();
    assert_eq!(generation.text.split_whitespace().count(), 2);

    let generation = adapter.caption(&solid_image(8, 8), Some(5)).await.unwrap();
    assert_eq!(generation.text.split_whitespace().count(), 5);
}

#[tokio::test]
async fn test_rgba_input_is_accepted() {
    let adapter = adapter_with(Arc::new(FakeLoader::new()));
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, image::Rgba([1, 2, 3, 0])));
    assert!(adapter.caption(&rgba, None).await.is_ok());
}

#[tokio::test]
async fn test_answer_trims_question() {
    let adapter = adapter_with(Arc::new(FakeLoader::new()));
    let generation = adapter
        .answer(&solid_image(16, 16), "  What color is the car?  ", None)
        .await
        .unwrap();

    assert_eq!(generation.text, ANSWER_TEXT);
    assert_eq!(generation.task, VisionTask::Vqa);
}

#[tokio::test]
async fn test_empty_question_rejected_without_loading() {
    let loader = Arc::new(FakeLoader::new());
    let adapter = adapter_with(loader.clone());

    for question in ["", "   ", "\n\t"] {
        match adapter.answer(&solid_image(8, 8), question, None).await {
            Err(VisionError::InvalidInput { field, .. }) => assert_eq!(field, "question"),
            other => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn test_zero_sized_image_rejected() {
    let adapter = adapter_with(Arc::new(FakeLoader::new()));
    let empty = DynamicImage::new_rgb8(0, 0);
    assert!(matches!(
        adapter.caption(&empty, None).await,
        Err(VisionError::Image(_))
    ));
}

#[tokio::test]
async fn test_max_length_bounds() {
    let adapter = adapter_with(Arc::new(FakeLoader::new()));
    assert!(matches!(
        adapter.caption(&solid_image(8, 8), Some(0)).await,
        Err(VisionError::InvalidInput { .. })
    ));
    assert!(matches!(
        adapter.caption(&solid_image(8, 8), Some(1)).await,
        Err(VisionError::InvalidInput { .. })
    ));
    assert!(adapter.caption(&solid_image(8, 8), Some(2)).await.is_ok());
    assert!(adapter.caption(&solid_image(8, 8), Some(512)).await.is_ok());
}

#[tokio::test]
async fn test_empty_output_is_an_error() {
    let adapter = adapter_with(Arc::new(FakeLoader::new().with_caption_text("")));
    assert!(matches!(
        adapter.caption(&solid_image(8, 8), None).await,
        Err(VisionError::EmptyOutput(_))
    ));
}

#[tokio::test]
async fn test_load_failure_surfaces_as_model_unavailable() {
    let adapter = adapter_with(Arc::new(FakeLoader::new().with_fetch_failures(1)));
    assert!(matches!(
        adapter.caption(&solid_image(8, 8), None).await,
        Err(VisionError::ModelUnavailable(_))
    ));
    assert!(adapter.caption(&solid_image(8, 8), None).await.is_ok());
}
