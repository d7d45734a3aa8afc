// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the BLIP vision encoder

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Square input resolution of the BLIP base vision transformer
pub const BLIP_INPUT_SIZE: u32 = 384;

/// CLIP normalization mean values
pub const MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];

/// CLIP normalization std values
pub const STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// Preprocess an image for the BLIP vision encoder
///
/// Steps:
/// 1. Resize to 384x384 with bicubic filtering (aspect ratio is not kept)
/// 2. Convert to RGB
/// 3. Normalize: (pixel/255 - mean) / std
/// 4. Lay out as NCHW [1, 3, 384, 384]
pub fn preprocess_for_blip(image: &DynamicImage) -> Array4<f32> {
    let resized = image.resize_exact(BLIP_INPUT_SIZE, BLIP_INPUT_SIZE, FilterType::CatmullRom);
    let rgb = resized.to_rgb8();

    let size = BLIP_INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}
