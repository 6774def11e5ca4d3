//! Test utilities for executor tests.
//!
//! Provides a scripted mock driver and speech synthesizer.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use forge_core::{Candidate, GenerateRequest, GenerateResponse, Output};
use forge_error::{ForgeResult, GatewayError, GatewayErrorKind};
use forge_interface::{AudioStream, ForgeDriver, SpeechSynthesis};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A candidate carrying an inline PNG payload
    Image(Vec<u8>),
    /// A candidate carrying text
    Text(String),
    /// A candidate with no content and the given finish reason
    Blocked(String),
    /// No candidates at all
    Empty,
    /// A transport-level failure
    Error(GatewayErrorKind),
    /// Never replies
    Hang,
    /// Reply after a delay
    Delayed(Duration, Box<MockResponse>),
}

/// How replies are chosen across calls.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Same reply every call
    Always(MockResponse),
    /// Replies in order; the last one repeats
    Sequence(Vec<MockResponse>),
}

/// Scripted [`ForgeDriver`] that counts calls and tracks peak concurrency.
#[derive(Clone)]
pub struct MockDriver {
    behavior: MockBehavior,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockDriver {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(response: MockResponse) -> Self {
        Self::new(MockBehavior::Always(response))
    }

    pub fn sequence(responses: Vec<MockResponse>) -> Self {
        Self::new(MockBehavior::Sequence(responses))
    }

    /// Fail `failures` times with `error`, then return `success`.
    pub fn fail_then(failures: usize, error: MockResponse, success: MockResponse) -> Self {
        let mut responses = vec![error; failures];
        responses.push(success);
        Self::sequence(responses)
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

    fn pick(&self, call: usize) -> MockResponse {
        match &self.behavior {
            MockBehavior::Always(response) => response.clone(),
            MockBehavior::Sequence(responses) => responses
                .get(call)
                .or_else(|| responses.last())
                .cloned()
                .unwrap_or(MockResponse::Empty),
        }
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn reply(response: MockResponse) -> ForgeResult<GenerateResponse> {
    let mut response = response;
    loop {
        match response {
            MockResponse::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                response = *inner;
            }
            MockResponse::Hang => return std::future::pending().await,
            MockResponse::Image(data) => {
                return Ok(candidate(vec![Output::Image {
                    mime: Some("image/png".to_string()),
                    data,
                }]));
            }
            MockResponse::Text(text) => return Ok(candidate(vec![Output::Text(text)])),
            MockResponse::Blocked(reason) => {
                return Ok(GenerateResponse {
                    candidates: vec![Candidate {
                        outputs: vec![],
                        finish_reason: Some(reason),
                    }],
                });
            }
            MockResponse::Empty => return Ok(GenerateResponse::default()),
            MockResponse::Error(kind) => return Err(GatewayError::new(kind).into()),
        }
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
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(Arc::clone(&self.active));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        reply(self.pick(call)).await
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Speech mock returning fixed chunks.
pub struct MockSpeech {
    chunks: Vec<&'static [u8]>,
    calls: Arc<AtomicUsize>,
}

impl MockSpeech {
    pub fn new(chunks: Vec<&'static [u8]>) -> Self {
        Self {
            chunks,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesis for MockSpeech {
    async fn synthesize(&self, _voice_id: &str, _text: &str) -> ForgeResult<AudioStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<ForgeResult<Bytes>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
