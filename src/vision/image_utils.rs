// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image decoding, normalisation and display helpers

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Maximum accepted upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Bounding box used when resizing images for the UI
pub const DISPLAY_MAX_WIDTH: u32 = 800;
pub const DISPLAY_MAX_HEIGHT: u32 = 600;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("Failed to save image to {path}: {message}")]
    SaveFailed { path: String, message: String },
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Decode a base64-encoded image
///
/// Accepts both bare base64 and `data:image/...;base64,` URLs as produced by
/// the browser's `FileReader.readAsDataURL`.
pub fn decode_base64_image(base64_str: &str) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let payload = strip_data_url(base64_str.trim());
    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(payload)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes (multipart uploads, files, webcam frames)
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

fn strip_data_url(input: &str) -> &str {
    if input.starts_with("data:") {
        match input.find(";base64,") {
            Some(idx) => &input[idx + ";base64,".len()..],
            None => input,
        }
    } else {
        input
    }
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Get the format extension as a string
pub fn format_to_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        _ => "unknown",
    }
}

/// Normalise any decoded image to 8-bit RGB for the model
///
/// Rejects zero-sized bitmaps; everything else (grayscale, RGBA, 16-bit)
/// is converted.
pub fn prepare_image(image: &DynamicImage) -> Result<DynamicImage, ImageError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyImage);
    }

    match image {
        DynamicImage::ImageRgb8(_) => Ok(image.clone()),
        other => Ok(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Shrink an image to fit within `max_width` x `max_height`, keeping aspect ratio
///
/// Images already inside the box are returned unchanged.
pub fn resize_for_display(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let scale = (max_width as f32 / width as f32)
        .min(max_height as f32 / height as f32)
        .min(1.0);

    if scale < 1.0 {
        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);
        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    } else {
        image.clone()
    }
}

/// Encode an image as PNG and return it base64-encoded
pub fn encode_png_base64(image: &DynamicImage) -> Result<String, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Save an image into `directory`, creating it if needed
pub fn save_image(
    image: &DynamicImage,
    directory: impl AsRef<Path>,
    filename: &str,
) -> Result<PathBuf, ImageError> {
    let directory = directory.as_ref();
    let save_path = directory.join(filename);

    std::fs::create_dir_all(directory).map_err(|e| ImageError::SaveFailed {
        path: directory.display().to_string(),
        message: e.to_string(),
    })?;

    image.save(&save_path).map_err(|e| ImageError::SaveFailed {
        path: save_path.display().to_string(),
        message: e.to_string(),
    })?;

    info!("💾 Image saved: {}", save_path.display());
    Ok(save_path)
}

/// Whether a file name looks like an example image the UI can show
pub fn is_example_image(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
}
