//! Request and response types for remote generation.

use crate::{Input, Output};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Kinds of content a response may contain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    /// Text parts
    Text,
    /// Inline image parts
    Image,
}

/// Generic generation request (multimodal-safe).
///
/// # Examples
///
/// ```
/// use forge_core::{GenerateRequest, Input, Modality};
///
/// let request = GenerateRequest::builder()
///     .contents(vec![Input::Text("Hello!".to_string())])
///     .model("gemini-2.5-flash")
///     .response_modalities(vec![Modality::Text])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.contents.len(), 1);
/// assert!(request.response_schema.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, Builder)]
#[builder(setter(into), default)]
pub struct GenerateRequest {
    /// Content parts in the order they are sent
    pub contents: Vec<Input>,
    /// Model identifier to use
    #[builder(setter(strip_option))]
    pub model: Option<String>,
    /// Modalities the response may contain (empty = provider default)
    pub response_modalities: Vec<Modality>,
    /// JSON schema constraining a text response
    #[builder(setter(strip_option))]
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// One alternative produced by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Candidate {
    /// Content parts of this candidate
    pub outputs: Vec<Output>,
    /// Reported finish reason (e.g. "STOP", "SAFETY"), if any
    pub finish_reason: Option<String>,
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use forge_core::{Candidate, GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     candidates: vec![Candidate {
///         outputs: vec![Output::Text("Hello!".to_string())],
///         finish_reason: None,
///     }],
/// };
///
/// assert_eq!(response.candidates.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateResponse {
    /// Candidates returned by the model
    pub candidates: Vec<Candidate>,
}
