//! Provider integrations for Narrative Forge.
//!
//! Each provider sits behind its own feature flag:
//!
//! - **Gemini** (Google) - `gemini` feature: image and text generation
//! - **ElevenLabs-compatible speech** - `elevenlabs` feature: streamed TTS
//!
//! Clients perform exactly one HTTP call per invocation; retries and
//! concurrency limits are applied by `forge_executor`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "elevenlabs")]
mod speech;

pub use config::{ModelsConfig, SpeechConfig};

#[cfg(feature = "gemini")]
pub use gemini::{
    GeminiCandidate, GeminiClient, GeminiContent, GeminiRequest, GeminiRequestBuilder,
    GeminiResponse, GenerationConfig, InlineData, Part, PromptFeedback, SafetySetting,
};

#[cfg(feature = "elevenlabs")]
pub use speech::HttpSpeechClient;
