//! Google Gemini provider.

mod client;
mod dto;

pub use client::GeminiClient;
pub use dto::{
    GeminiCandidate, GeminiContent, GeminiRequest, GeminiRequestBuilder, GeminiResponse,
    GenerationConfig, InlineData, Part, PromptFeedback, SafetySetting,
};
