//! Streaming text-to-speech over HTTP (ElevenLabs-compatible API).

use crate::SpeechConfig;
use async_trait::async_trait;
use bytes::Bytes;
use forge_error::{ForgeError, ForgeResult, GatewayError, GatewayErrorKind, HttpError};
use forge_interface::{AudioStream, SpeechSynthesis};
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Speech client that streams the response body chunk by chunk.
#[derive(Clone)]
pub struct HttpSpeechClient {
    client: Client,
    api_key: String,
    config: SpeechConfig,
}

impl std::fmt::Debug for HttpSpeechClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSpeechClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpSpeechClient {
    /// Creates a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: SpeechConfig) -> Self {
        debug!(endpoint = %config.endpoint(), "Creating speech client");
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
    pub fn from_env(config: SpeechConfig) -> ForgeResult<Self> {
        let api_key = std::env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::new(GatewayErrorKind::MissingApiKey(
                    config.api_key_env().clone(),
                ))
            })?;
        Ok(Self::new(api_key, config))
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.config.endpoint(),
            voice_id,
            self.config.output_format()
        )
    }
}

#[async_trait]
impl SpeechSynthesis for HttpSpeechClient {
    #[instrument(name = "speech_synthesize", skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, voice_id: &str, text: &str) -> ForgeResult<AudioStream> {
        let body = SpeechRequest {
            text,
            model_id: self.config.model(),
        };

        let response = self
            .client
            .post(self.endpoint(voice_id))
            .header("xi-api-key", &self.api_key)
            .header("accept", self.config.accept_mime())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send speech request");
                GatewayError::new(GatewayErrorKind::Transport(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, body = %message, "Speech API returned error");
            return Err(GatewayError::new(GatewayErrorKind::HttpStatus {
                status_code: status.as_u16(),
                message,
            })
            .into());
        }

        let stream = response.bytes_stream().map(|chunk| -> ForgeResult<Bytes> {
            chunk.map_err(|e| {
                warn!(error = %e, "Speech stream interrupted");
                ForgeError::from(HttpError::new(format!("Speech stream interrupted: {}", e)))
            })
        });
        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }
}
