//! Google Gemini REST client.
//!
//! Speaks `models/{model}:generateContent` directly over `reqwest`, which
//! gives access to inline image parts, response modalities and schema
//! constrained JSON.
//!
//! # Example
//!
//! ```no_run
//! use forge_core::{GenerateRequest, Input, Modality};
//! use forge_interface::{ForgeDriver, first_image};
//! use forge_models::{GeminiClient, ModelsConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::from_env(ModelsConfig::default())?;
//! let request = GenerateRequest {
//!     contents: vec![Input::Text("A lighthouse in a storm".to_string())],
//!     response_modalities: vec![Modality::Text, Modality::Image],
//!     ..Default::default()
//! };
//! let image = first_image(&client.generate(&request).await?)?;
//! # Ok(())
//! # }
//! ```

use super::dto::{
    GeminiCandidate, GeminiContent, GeminiRequest, GeminiResponse, GenerationConfig, Part,
    SafetySetting,
};
use crate::ModelsConfig;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use forge_core::{Candidate, GenerateRequest, GenerateResponse, Input, MediaSource, Output};
use forge_error::{ForgeResult, GatewayError, GatewayErrorKind};
use forge_interface::ForgeDriver;
use reqwest::Client;
use tracing::{debug, error, instrument, warn};

const DEFAULT_REFERENCE_MIME: &str = "image/jpeg";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

//
// ─── CLIENT ─────────────────────────────────────────────────────────────────────
//

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: ModelsConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: ModelsConfig) -> Self {
        debug!(base_url = %config.base_url(), "Creating Gemini client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Creates a client reading the key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` when the variable is unset or blank.
    pub fn from_env(config: ModelsConfig) -> ForgeResult<Self> {
        let api_key = std::env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::new(GatewayErrorKind::MissingApiKey(
                    config.api_key_env().to_string(),
                ))
            })?;
        Ok(Self::new(api_key, config))
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            model
        )
    }

    /// Sends one request to the API.
    #[instrument(name = "gemini_generate", skip(self, request), fields(model = %model))]
    pub async fn generate_gemini(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GatewayError> {
        let parts: usize = request.contents.iter().map(|c| c.parts.len()).sum();
        debug!(parts, "Sending request to Gemini API");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send request to Gemini API");
                GatewayError::new(GatewayErrorKind::Transport(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API returned error");
            return Err(GatewayError::new(GatewayErrorKind::HttpStatus {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        let body = response.text().await.map_err(|e| {
            GatewayError::new(GatewayErrorKind::Transport(format!(
                "Failed to read response body: {}",
                e
            )))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response");
            GatewayError::new(GatewayErrorKind::InvalidResponse(e.to_string()))
        })
    }

    /// Converts a [`GenerateRequest`] into the Gemini wire format.
    ///
    /// Image requests always carry `BLOCK_ONLY_HIGH` thresholds for the four
    /// harm categories; schema-constrained requests ask for JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for an unusable image source.
    pub fn convert_request(request: &GenerateRequest) -> Result<GeminiRequest, GatewayError> {
        let parts = request
            .contents
            .iter()
            .map(convert_input)
            .collect::<Result<Vec<_>, _>>()?;

        let generation_config = GenerationConfig {
            response_modalities: request
                .response_modalities
                .iter()
                .map(ToString::to_string)
                .collect(),
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
        };
        let has_config = generation_config != GenerationConfig::default();

        let safety_settings = if request.response_modalities.is_empty() {
            Vec::new()
        } else {
            HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: "BLOCK_ONLY_HIGH".to_string(),
                })
                .collect()
        };

        GeminiRequest::builder()
            .contents(vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }])
            .generation_config(has_config.then_some(generation_config))
            .safety_settings(safety_settings)
            .build()
            .map_err(|e| GatewayError::new(GatewayErrorKind::InvalidReference(e.to_string())))
    }

    /// Converts a Gemini response into a [`GenerateResponse`].
    ///
    /// # Errors
    ///
    /// Returns `Base64Decode` if an inline part is not valid base64.
    pub fn convert_response(response: GeminiResponse) -> Result<GenerateResponse, GatewayError> {
        if response.candidates.is_empty() {
            let reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            if let Some(reason) = reason {
                warn!(block_reason = reason, "Prompt was blocked");
            }
        }

        let candidates = response
            .candidates
            .into_iter()
            .map(convert_candidate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GenerateResponse { candidates })
    }
}

fn convert_input(input: &Input) -> Result<Part, GatewayError> {
    match input {
        Input::Text(text) => Ok(Part::text(text.clone())),
        Input::Image { mime, source } => {
            let (parsed_mime, data) = encode_source(source)?;
            let mime = mime
                .clone()
                .or(parsed_mime)
                .unwrap_or_else(|| DEFAULT_REFERENCE_MIME.to_string());
            Ok(Part::inline(mime, data))
        }
    }
}

/// Base64 payload of a media source, plus the MIME type a data URL declares.
fn encode_source(source: &MediaSource) -> Result<(Option<String>, String), GatewayError> {
    match source {
        MediaSource::Binary(bytes) => Ok((None, STANDARD.encode(bytes))),
        MediaSource::Base64(data) => Ok((None, data.clone())),
        MediaSource::DataUrl(url) => {
            let (header, payload) = url
                .strip_prefix("data:")
                .and_then(|rest| rest.split_once(','))
                .ok_or_else(|| {
                    GatewayError::new(GatewayErrorKind::InvalidReference(
                        "expected data:<mime>;base64,<payload>".to_string(),
                    ))
                })?;
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            if payload.is_empty() {
                return Err(GatewayError::new(GatewayErrorKind::InvalidReference(
                    "data URL has an empty payload".to_string(),
                )));
            }
            Ok((mime, payload.to_string()))
        }
    }
}

fn convert_candidate(candidate: GeminiCandidate) -> Result<Candidate, GatewayError> {
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut outputs = Vec::with_capacity(parts.len());
    for part in parts {
        if let Some(inline) = part.inline_data {
            let data = STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| GatewayError::new(GatewayErrorKind::Base64Decode(e.to_string())))?;
            let output = if inline.mime_type.starts_with("audio/") {
                Output::Audio {
                    mime: Some(inline.mime_type),
                    data,
                }
            } else {
                Output::Image {
                    mime: Some(inline.mime_type),
                    data,
                }
            };
            outputs.push(output);
        }
        if let Some(text) = part.text {
            outputs.push(Output::Text(text));
        }
    }
    Ok(Candidate {
        outputs,
        finish_reason: candidate.finish_reason,
    })
}

#[async_trait]
impl ForgeDriver for GeminiClient {
    #[instrument(skip(self, req), fields(model))]
    async fn generate(&self, req: &GenerateRequest) -> ForgeResult<GenerateResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.config.text().to_string());
        tracing::Span::current().record("model", model.as_str());

        let body = Self::convert_request(req)?;
        let response = self.generate_gemini(&model, &body).await?;
        Ok(Self::convert_response(response)?)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    /// Returns the default model used when `GenerateRequest.model` is None.
    fn model_name(&self) -> &str {
        self.config.text()
    }
}
