// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Still-frame capture for webcam mode
//!
//! The browser usually supplies the frame (`getUserMedia`). Builds with the
//! `webcam` feature can also grab one from a local V4L2 device.

#[cfg(feature = "webcam")]
pub mod device;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, RgbImage};
use std::sync::Arc;
use thiserror::Error;

use crate::config::WebcamConfig;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Webcam capture is not available: {0}")]
    Unavailable(String),

    #[error("Webcam device error: {0}")]
    Device(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Capture task failed: {0}")]
    Join(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Device(e.to_string())
    }
}

/// One still frame
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: DynamicImage,
    /// `browser` or the device path
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    pub fn new(image: DynamicImage, source: impl Into<String>) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            source: source.into(),
            width,
            height,
            captured_at: Utc::now(),
        }
    }
}

/// Something that can produce a single frame on demand
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError>;

    fn name(&self) -> String;
}

/// Frame source used when the server cannot capture by itself
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl FrameSource for UnavailableSource {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        Err(CaptureError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> String {
        "unavailable".to_string()
    }
}

/// The server-side frame source for this build
#[cfg(feature = "webcam")]
pub fn default_source(config: &WebcamConfig) -> Arc<dyn FrameSource> {
    Arc::new(device::V4lFrameSource::new(config.clone()))
}

#[cfg(not(feature = "webcam"))]
pub fn default_source(config: &WebcamConfig) -> Arc<dyn FrameSource> {
    Arc::new(UnavailableSource::new(format!(
        "built without the `webcam` feature; cannot open {}. Use the browser camera instead",
        config.device
    )))
}

/// Convert packed YUYV 4:2:2 to RGB (BT.601, limited range)
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage, CaptureError> {
    let expected = width as usize * height as usize * 2;
    if width % 2 != 0 || data.len() < expected {
        return Err(CaptureError::Decode(format!(
            "YUYV buffer of {} bytes does not fit {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for quad in data[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        rgb.extend_from_slice(&yuv_pixel(y0, u, v));
        rgb.extend_from_slice(&yuv_pixel(y1, u, v));
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| CaptureError::Decode("RGB buffer size mismatch".to_string()))
}

fn yuv_pixel(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as f32 - 16.0;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;

    let r = 1.164 * c + 1.596 * e;
    let g = 1.164 * c - 0.392 * d - 0.813 * e;
    let b = 1.164 * c + 2.017 * d;

    [clamp(r), clamp(g), clamp(b)]
}

fn clamp(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
