// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! V4L2 frame source

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::{yuyv_to_rgb, CaptureError, CapturedFrame, FrameSource};
use crate::config::WebcamConfig;

const BUFFER_COUNT: u32 = 4;

/// Opens the device for every capture and releases it afterwards
pub struct V4lFrameSource {
    config: WebcamConfig,
}

impl V4lFrameSource {
    pub fn new(config: WebcamConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl FrameSource for V4lFrameSource {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || grab_frame(&config))
            .await
            .map_err(|e| CaptureError::Join(e.to_string()))?
    }

    fn name(&self) -> String {
        self.config.device.clone()
    }
}

fn grab_frame(config: &WebcamConfig) -> Result<CapturedFrame, CaptureError> {
    let device = Device::with_path(&config.device).map_err(|e| {
        CaptureError::Device(format!("Cannot open webcam {}: {}", config.device, e))
    })?;

    let mut format = device.format()?;
    format.width = config.width;
    format.height = config.height;
    format.fourcc = FourCC::new(b"MJPG");
    let actual = device.set_format(&format)?;

    if actual.fourcc != format.fourcc {
        warn!(
            "Requested MJPG not supported by {}, using {}",
            config.device, actual.fourcc
        );
    }
    info!(
        "📸 Capturing from {} at {}x{} ({})",
        config.device, actual.width, actual.height, actual.fourcc
    );

    let mut stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)?;

    for _ in 0..config.warmup_frames {
        stream.next()?;
    }

    let (buffer, metadata) = stream.next()?;
    debug!(
        "Frame {} ({} bytes used)",
        metadata.sequence, metadata.bytesused
    );
    // Some drivers leave bytesused at zero for mmap buffers
    let data = match metadata.bytesused as usize {
        0 => buffer,
        used => &buffer[..used.min(buffer.len())],
    };

    let image = match &actual.fourcc.repr {
        b"MJPG" | b"JPEG" => image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| CaptureError::Decode(e.to_string()))?,
        b"YUYV" => DynamicImage::ImageRgb8(yuyv_to_rgb(data, actual.width, actual.height)?),
        other => {
            return Err(CaptureError::UnsupportedFormat(
                String::from_utf8_lossy(other).to_string(),
            ))
        }
    };

    Ok(CapturedFrame::new(image, config.device.clone()))
}
