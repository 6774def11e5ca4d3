#![cfg(all(feature = "gemini", feature = "elevenlabs"))]

//! Tests for the HTTP clients against a local canned server.

mod test_utils;

use forge_core::{GenerateRequest, Input, Modality};
use forge_error::{ErrorCategory, ForgeErrorKind, GatewayErrorKind, RetryableError};
use forge_interface::{ForgeDriver, SpeechSynthesis, collect_audio, first_image};
use forge_models::{GeminiClient, HttpSpeechClient, ModelsConfig, SpeechConfig};
use test_utils::CannedServer;

fn image_request() -> GenerateRequest {
    GenerateRequest {
        contents: vec![Input::Text("A ghost ship".to_string())],
        model: Some("image-model".to_string()),
        response_modalities: vec![Modality::Text, Modality::Image],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_gemini_image_roundtrip() -> anyhow::Result<()> {
    let body = serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AQID"}}]},
            "finishReason": "STOP"
        }]
    })
    .to_string();
    let server = CannedServer::start(200, "application/json", body).await?;
    let config = ModelsConfig::default().with_base_url(&server.base_url);
    let client = GeminiClient::new("test-key", config);

    let response = client.generate(&image_request()).await?;
    let image = first_image(&response)?;

    assert_eq!(image.bytes, vec![1, 2, 3]);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].head.starts_with("POST /v1beta/models/image-model:generateContent"));
    assert!(requests[0].head.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
    assert!(requests[0].body.contains("\"responseModalities\":[\"TEXT\",\"IMAGE\"]"));
    Ok(())
}

#[tokio::test]
async fn test_gemini_overload_is_retryable() -> anyhow::Result<()> {
    let server = CannedServer::start(503, "text/plain", "model overloaded").await?;
    let client = GeminiClient::new("k", ModelsConfig::default().with_base_url(&server.base_url));

    let err = client.generate(&image_request()).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.category(), ErrorCategory::TransientNetwork);
    match err.kind() {
        ForgeErrorKind::Gateway(e) => assert_eq!(
            e.kind,
            GatewayErrorKind::HttpStatus {
                status_code: 503,
                message: "model overloaded".to_string()
            }
        ),
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_gemini_bad_request_is_permanent() -> anyhow::Result<()> {
    let server = CannedServer::start(400, "application/json", "{\"error\":{}}").await?;
    let client = GeminiClient::new("k", ModelsConfig::default().with_base_url(&server.base_url));
    let err = client.generate(&image_request()).await.unwrap_err();
    assert!(!err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_gemini_garbage_body_is_retryable() -> anyhow::Result<()> {
    let server = CannedServer::start(200, "application/json", "<html>").await?;
    let client = GeminiClient::new("k", ModelsConfig::default().with_base_url(&server.base_url));
    let err = client.generate(&image_request()).await.unwrap_err();
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_speech_streams_body() -> anyhow::Result<()> {
    let server = CannedServer::start(200, "audio/mpeg", b"ID3fakeaudio".to_vec()).await?;
    let config = SpeechConfig::default().with_endpoint(&server.base_url);
    let client = HttpSpeechClient::new("k", config);

    let audio = collect_audio(client.synthesize("voice-123", "Hello there").await?).await?;

    assert_eq!(audio, b"ID3fakeaudio");
    let requests = server.requests();
    assert!(requests[0].head.starts_with("POST /v1/text-to-speech/voice-123/stream"));
    assert!(requests[0].head.to_ascii_lowercase().contains("accept: audio/mpeg"));
    assert!(requests[0].body.contains("\"text\":\"Hello there\""));
    Ok(())
}

#[tokio::test]
async fn test_speech_accepts_raw_pcm_when_configured() -> anyhow::Result<()> {
    let server = CannedServer::start(200, "audio/pcm", vec![0u8, 1, 2, 3]).await?;
    let config = SpeechConfig::default()
        .with_endpoint(&server.base_url)
        .with_output_format("pcm_24000");
    let client = HttpSpeechClient::new("k", config);

    let audio = collect_audio(client.synthesize("voice-123", "Hello there").await?).await?;

    assert_eq!(audio, vec![0u8, 1, 2, 3]);
    let head = server.requests()[0].head.to_ascii_lowercase();
    assert!(head.contains("output_format=pcm_24000"));
    assert!(head.contains("accept: audio/pcm"));
    assert!(!head.contains("audio/mpeg"));
    Ok(())
}

#[tokio::test]
async fn test_speech_rate_limit_is_retryable() -> anyhow::Result<()> {
    let server = CannedServer::start(429, "application/json", "{}").await?;
    let config = SpeechConfig::default().with_endpoint(&server.base_url);
    let client = HttpSpeechClient::new("k", config);
    let err = match client.synthesize("v", "t").await {
        Ok(_) => anyhow::bail!("expected an error"),
        Err(e) => e,
    };
    assert!(err.is_retryable());
    Ok(())
}

#[test]
fn test_missing_key_is_user_input() -> anyhow::Result<()> {
    let config: ModelsConfig = serde_json::from_value(serde_json::json!({
        "api_key_env": "FORGE_TEST_UNSET_GEMINI_KEY"
    }))?;
    let err = GeminiClient::from_env(config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UserInputMissing);
    assert!(!err.is_retryable());
    Ok(())
}
