//! Test utilities for story orchestration tests.
//!
//! Provides a prompt-routed mock driver, a speech mock and a decoder mock.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use forge_core::{Candidate, GenerateRequest, GenerateResponse, Input, Output, PcmFormat};
use forge_error::{ForgeResult, GatewayError, GatewayErrorKind};
use forge_executor::{ExecutorConfig, GenerationService, TaskExecutor};
use forge_interface::{AudioStream, ForgeDriver, SpeechSynthesis};
use forge_media::AudioDecoder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A candidate carrying an inline PNG payload
    Image(Vec<u8>),
    /// A candidate carrying text
    Text(String),
    /// A permanent HTTP failure
    Rejected(u16),
}

/// [`ForgeDriver`] that answers by the first rule whose marker occurs in any
/// of the request's text parts.
#[derive(Clone)]
pub struct MockDriver {
    rules: Vec<(String, MockResponse)>,
    fallback: MockResponse,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockDriver {
    pub fn new(fallback: MockResponse) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn images() -> Self {
        Self::new(MockResponse::Image(PNG.to_vec()))
    }

    pub fn when(mut self, marker: &str, response: MockResponse) -> Self {
        self.rules.push((marker.to_string(), response));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn pick(&self, request: &GenerateRequest) -> MockResponse {
        let texts: Vec<&str> = request
            .contents
            .iter()
            .filter_map(|input| match input {
                Input::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        self.rules
            .iter()
            .find(|(marker, _)| texts.iter().any(|text| text.contains(marker.as_str())))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn candidate(outputs: Vec<Output>) -> GenerateResponse {
    GenerateResponse {
        candidates: vec![Candidate {
            outputs,
            finish_reason: Some("STOP".to_string()),
        }],
    }
}

#[async_trait]
impl ForgeDriver for MockDriver {
    async fn generate(&self, req: &GenerateRequest) -> ForgeResult<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(Arc::clone(&self.active));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.pick(req) {
            MockResponse::Image(data) => Ok(candidate(vec![Output::Image {
                mime: Some("image/png".to_string()),
                data,
            }])),
            MockResponse::Text(text) => Ok(candidate(vec![Output::Text(text)])),
            MockResponse::Rejected(status_code) => Err(GatewayError::new(
                GatewayErrorKind::HttpStatus {
                    status_code,
                    message: "rejected by mock".to_string(),
                },
            )
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Speech mock that echoes the line's bytes and refuses lines containing
/// `fail_marker`.
#[derive(Clone, Default)]
pub struct MockSpeech {
    fail_marker: Option<String>,
    voices: Arc<Mutex<Vec<String>>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesis for MockSpeech {
    async fn synthesize(&self, voice_id: &str, text: &str) -> ForgeResult<AudioStream> {
        if let Ok(mut voices) = self.voices.lock() {
            voices.push(voice_id.to_string());
        }
        if self.fail_marker.as_deref().is_some_and(|m| text.contains(m)) {
            return Err(GatewayError::new(GatewayErrorKind::HttpStatus {
                status_code: 400,
                message: "unspeakable".to_string(),
            })
            .into());
        }
        let chunk: ForgeResult<Bytes> = Ok(Bytes::from(text.as_bytes().to_vec()));
        Ok(Box::pin(futures::stream::iter(vec![chunk])))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Decoder producing `SAMPLES_PER_BYTE` silent mono samples per input byte
/// at 1 kHz.
pub struct MockDecoder;

pub const SAMPLES_PER_BYTE: usize = 10;

#[async_trait]
impl AudioDecoder for MockDecoder {
    async fn decode(&self, encoded: Vec<u8>) -> ForgeResult<Vec<f32>> {
        Ok(vec![0.0; encoded.len() * SAMPLES_PER_BYTE])
    }

    fn format(&self) -> PcmFormat {
        PcmFormat::new(1_000, 1)
    }
}

/// Executor tuned for quick failures.
pub fn fast_config() -> ExecutorConfig {
    ExecutorConfig::builder()
        .max_retries(2)
        .base_delay_ms(1)
        .timeout_ms(5_000)
        .build()
}

pub fn service(driver: &MockDriver) -> anyhow::Result<Arc<GenerationService>> {
    let executor = TaskExecutor::new(fast_config())?;
    Ok(Arc::new(GenerationService::new(Arc::new(driver.clone()), executor)))
}

pub fn speaking_service(
    driver: &MockDriver,
    speech: &MockSpeech,
) -> anyhow::Result<Arc<GenerationService>> {
    let executor = TaskExecutor::new(fast_config())?;
    Ok(Arc::new(
        GenerationService::new(Arc::new(driver.clone()), executor)
            .with_speech(Arc::new(speech.clone())),
    ))
}
