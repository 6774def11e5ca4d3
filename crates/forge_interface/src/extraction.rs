//! Success checks applied to gateway responses.
//!
//! A response only counts as a success when it carries usable content;
//! everything else becomes a retryable rejection rather than a crash.

use crate::AudioStream;
use forge_core::{Candidate, GenerateResponse, ImageData, Output};
use forge_error::{ForgeResult, GatewayError, GatewayErrorKind};
use futures_util::StreamExt;
use tracing::{debug, warn};

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// First candidate that carries any content, or the matching rejection.
fn content_candidate(response: &GenerateResponse) -> ForgeResult<&Candidate> {
    let Some(first) = response.candidates.first() else {
        return Err(GatewayError::new(GatewayErrorKind::NoCandidates).into());
    };

    match response.candidates.iter().find(|c| !c.outputs.is_empty()) {
        Some(candidate) => Ok(candidate),
        None => {
            let finish_reason = first
                .finish_reason
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string());
            warn!(finish_reason = %finish_reason, "Candidate returned without content");
            Err(GatewayError::new(GatewayErrorKind::ContentBlocked { finish_reason }).into())
        }
    }
}

/// Extract the first inline image from a response.
///
/// # Errors
///
/// `NoCandidates`, `ContentBlocked` or `NoImageData` when the response has no
/// usable image.
///
/// # Examples
///
/// ```
/// use forge_core::{Candidate, GenerateResponse, Output};
/// use forge_interface::first_image;
///
/// let response = GenerateResponse {
///     candidates: vec![Candidate {
///         outputs: vec![
///             Output::Text("Here is your panel".into()),
///             Output::Image { mime: Some("image/png".into()), data: vec![1, 2, 3] },
///         ],
///         finish_reason: Some("STOP".into()),
///     }],
/// };
/// assert_eq!(first_image(&response).unwrap().bytes, vec![1, 2, 3]);
/// ```
pub fn first_image(response: &GenerateResponse) -> ForgeResult<ImageData> {
    let candidate = content_candidate(response)?;
    candidate
        .outputs
        .iter()
        .find_map(|output| match output {
            Output::Image { mime, data } if !data.is_empty() => Some(ImageData::new(
                mime.clone().unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                data.clone(),
            )),
            _ => None,
        })
        .ok_or_else(|| GatewayError::new(GatewayErrorKind::NoImageData).into())
}

/// Concatenate the text parts of the first content-bearing candidate, trimmed.
///
/// # Errors
///
/// `NoCandidates`, `ContentBlocked` or `EmptyText`.
pub fn response_text(response: &GenerateResponse) -> ForgeResult<String> {
    let candidate = content_candidate(response)?;
    let text: String = candidate
        .outputs
        .iter()
        .filter_map(|output| match output {
            Output::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::new(GatewayErrorKind::EmptyText).into());
    }
    Ok(trimmed.to_string())
}

/// Drain a speech stream into one buffer.
pub async fn collect_audio(mut stream: AudioStream) -> ForgeResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.extend_from_slice(&chunk);
        chunks += 1;
    }
    debug!(chunks, bytes = buffer.len(), "Collected synthesized audio");
    Ok(buffer)
}
