//! Media source types for multimodal content.

use serde::{Deserialize, Serialize};

/// Where media content is sourced from.
///
/// # Examples
///
/// ```
/// use forge_core::MediaSource;
///
/// let base64 = MediaSource::Base64("iVBORw0KGgo...".to_string());
/// let binary = MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]);
/// let data_url = MediaSource::DataUrl("data:image/jpeg;base64,/9j/4AAQ".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaSource {
    /// Base64-encoded content
    Base64(String),
    /// Raw binary data
    Binary(Vec<u8>),
    /// A `data:<mime>;base64,<payload>` URL, as captured from a camera
    DataUrl(String),
}

/// An encoded still image (PNG, JPEG, ...) with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageData {
    /// MIME type, e.g. "image/png"
    pub mime: String,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Wrap encoded bytes with their MIME type.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
