//! Trait definitions for the remote generation and speech services.

use async_trait::async_trait;
use bytes::Bytes;
use forge_core::{GenerateRequest, GenerateResponse};
use forge_error::ForgeResult;
use futures_util::stream::Stream;
use std::pin::Pin;

/// Stream of encoded audio chunks as they arrive from a speech service.
pub type AudioStream = Pin<Box<dyn Stream<Item = ForgeResult<Bytes>> + Send>>;

/// Core trait that every generative backend implements.
///
/// Implementations perform exactly one remote call per invocation. Retries,
/// timeouts and admission control belong to the executor.
#[async_trait]
pub trait ForgeDriver: Send + Sync {
    /// Generate model output given a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> ForgeResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier used when the request names none.
    fn model_name(&self) -> &str;
}

/// Text-to-speech capability with streamed output.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Start synthesizing `text` with `voice_id`.
    ///
    /// The returned stream yields encoded audio chunks; callers concatenate
    /// them into one buffer.
    async fn synthesize(&self, voice_id: &str, text: &str) -> ForgeResult<AudioStream>;

    /// Provider name (e.g., "elevenlabs").
    fn provider_name(&self) -> &'static str;
}
