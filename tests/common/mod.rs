// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vision2lang::api::AppState;
use vision2lang::tts::{SpeechAudio, SpeechService, SpeechSynthesizer, TtsError};
use vision2lang::vision::{
    DevicePreference, ExecutionDevice, InferenceAdapter, LoadError, ModelLoader,
    VisionLanguageModel, VisionModelManager, VisionTask,
};
use vision2lang::webcam::{CaptureError, CapturedFrame, FrameSource, UnavailableSource};
use vision2lang::workflows::Workflows;

pub const CAPTION_TEXT: &str = "a red car parked on the side of the street";
pub const ANSWER_TEXT: &str = "red";

/// Model that echoes canned text, truncated to `max_length` words
pub struct FakeModel {
    text: String,
    device: ExecutionDevice,
    pub questions: Mutex<Vec<Option<String>>>,
}

impl FakeModel {
    pub fn new(text: impl Into<String>, device: ExecutionDevice) -> Self {
        Self {
            text: text.into(),
            device,
            questions: Mutex::new(Vec::new()),
        }
    }
}

impl VisionLanguageModel for FakeModel {
    fn generate(
        &self,
        _image: &DynamicImage,
        question: Option<&str>,
        max_length: usize,
    ) -> anyhow::Result<String> {
        self.questions
            .lock()
            .unwrap()
            .push(question.map(str::to_string));
        let words: Vec<&str> = self.text.split_whitespace().take(max_length).collect();
        Ok(words.join(" "))
    }

    fn device(&self) -> ExecutionDevice {
        self.device
    }
}

/// Loader with scripted failures and a load counter
#[derive(Default)]
pub struct FakeLoader {
    pub loads: AtomicUsize,
    pub attempts: Mutex<Vec<(VisionTask, ExecutionDevice)>>,
    /// Accelerator loads fail with an out-of-memory device error
    pub oom_on_accelerator: bool,
    /// Number of upcoming loads that fail with a fetch error
    pub fetch_failures: AtomicUsize,
    pub delay: Option<Duration>,
    pub caption_text: Option<String>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oom_on_accelerator(mut self) -> Self {
        self.oom_on_accelerator = true;
        self
    }

    pub fn with_fetch_failures(self, count: usize) -> Self {
        self.fetch_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_caption_text(mut self, text: impl Into<String>) -> Self {
        self.caption_text = Some(text.into());
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn attempted_devices(&self) -> Vec<ExecutionDevice> {
        self.attempts.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

#[async_trait]
impl ModelLoader for FakeLoader {
    fn model_id(&self, task: VisionTask) -> String {
        format!("fake/{}", task)
    }

    async fn load(
        &self,
        task: VisionTask,
        device: ExecutionDevice,
    ) -> Result<Arc<dyn VisionLanguageModel>, LoadError> {
        self.attempts.lock().unwrap().push((task, device));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.oom_on_accelerator && device.is_accelerator() {
            return Err(LoadError::Device {
                device: device.to_string(),
                message: "CUDA out of memory. Tried to allocate 1.2 GiB".to_string(),
            });
        }

        let failed = self
            .fetch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LoadError::Fetch {
                repo: format!("fake/{}", task),
                file: "tokenizer.json".to_string(),
                message: "connection refused".to_string(),
            });
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        let text = match task {
            VisionTask::Caption => self
                .caption_text
                .clone()
                .unwrap_or_else(|| CAPTION_TEXT.to_string()),
            VisionTask::Vqa => ANSWER_TEXT.to_string(),
        };
        Ok(Arc::new(FakeModel::new(text, device)))
    }
}

/// Synthesizer that always returns the same bytes
pub struct FixedSynth(pub Vec<u8>);

#[async_trait]
impl SpeechSynthesizer for FixedSynth {
    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio, TtsError> {
        Ok(SpeechAudio::mp3(self.0.clone(), "fixed"))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Synthesizer whose backend is always down
pub struct FailingSynth;

#[async_trait]
impl SpeechSynthesizer for FailingSynth {
    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio, TtsError> {
        Err(TtsError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Frame source returning a solid colour frame
pub struct StaticFrameSource;

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        let image = ImageBuffer::from_fn(1280, 960, |_, _| Rgb([200u8, 30, 30]));
        Ok(CapturedFrame::new(
            DynamicImage::ImageRgb8(image),
            "/dev/video0",
        ))
    }

    fn name(&self) -> String {
        "static".to_string()
    }
}

pub fn manager_with(loader: Arc<FakeLoader>, preference: DevicePreference) -> Arc<VisionModelManager> {
    Arc::new(VisionModelManager::with_loader(loader, preference))
}

pub fn adapter_with(loader: Arc<FakeLoader>) -> InferenceAdapter {
    InferenceAdapter::new(manager_with(loader, DevicePreference::Cpu))
}

pub fn workflows(
    loader: Arc<FakeLoader>,
    speech: SpeechService,
    frames: Arc<dyn FrameSource>,
) -> Workflows {
    Workflows::new(adapter_with(loader), speech, frames)
}

/// App state with fake models, working speech and no server webcam
pub fn test_state(loader: Arc<FakeLoader>) -> AppState {
    let speech = SpeechService::with_synthesizer(Arc::new(FixedSynth(vec![0xFF, 0xFB, 0x90, 0x00])));
    let frames: Arc<dyn FrameSource> = Arc::new(UnavailableSource::new("no camera in tests"));
    AppState::new(workflows(loader, speech, frames), "data")
}

pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| {
        Rgb([128u8, 128u8, 128u8])
    }))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    solid_image(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}
