//! Input types for generation requests.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// Content parts sent to the generative service.
///
/// # Examples
///
/// ```
/// use forge_core::{Input, MediaSource};
///
/// let text = Input::Text("Draw the captain".to_string());
/// let image = Input::Image {
///     mime: Some("image/jpeg".to_string()),
///     source: MediaSource::Binary(vec![0xFF, 0xD8]),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP, ...).
    Image {
        /// MIME type, e.g., "image/png" or "image/jpeg"
        mime: Option<String>,
        /// Media source (base64, raw bytes or data URL)
        source: MediaSource,
    },
}
