//! Provider settings, loaded from the `[models]` and `[speech]` config sections.

use serde::{Deserialize, Serialize};

/// Gemini endpoint and model selection.
///
/// # Examples
///
/// ```
/// use forge_models::ModelsConfig;
///
/// let config = ModelsConfig::default();
/// assert_eq!(config.image(), "gemini-2.5-flash-image-preview");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model used to illustrate panels
    #[serde(default = "default_image_model")]
    image: String,
    /// Model used for script extraction and other text calls
    #[serde(default = "default_text_model")]
    text: String,
    /// API root, without a trailing slash
    #[serde(default = "default_base_url")]
    base_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            image: default_image_model(),
            text: default_text_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl ModelsConfig {
    /// Image model name.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Text model name.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the API key variable.
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Point the client at another API root (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Streaming text-to-speech endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct SpeechConfig {
    /// API root, without a trailing slash
    #[serde(default = "default_speech_endpoint")]
    endpoint: String,
    /// Synthesis model identifier
    #[serde(default = "default_speech_model")]
    model: String,
    /// Requested audio encoding
    #[serde(default = "default_output_format")]
    output_format: String,
    /// Environment variable holding the API key
    #[serde(default = "default_speech_key_env")]
    api_key_env: String,
}

fn default_speech_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_speech_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_speech_key_env() -> String {
    "SPEECH_API_KEY".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            model: default_speech_model(),
            output_format: default_output_format(),
            api_key_env: default_speech_key_env(),
        }
    }
}

impl SpeechConfig {
    /// Point the client at another API root.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
    /// Request another audio encoding, e.g. `pcm_24000`.
    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }

    /// MIME type to accept for the configured `output_format`.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_models::SpeechConfig;
    ///
    /// assert_eq!(SpeechConfig::default().accept_mime(), "audio/mpeg");
    /// let pcm = SpeechConfig::default().with_output_format("pcm_24000");
    /// assert_eq!(pcm.accept_mime(), "audio/pcm");
    /// ```
    pub fn accept_mime(&self) -> &'static str {
        let codec = self.output_format.split('_').next().unwrap_or_default();
        match codec.to_ascii_lowercase().as_str() {
            "mp3" => "audio/mpeg",
            "pcm" => "audio/pcm",
            "ulaw" => "audio/basic",
            "alaw" => "audio/x-alaw-basic",
            "opus" => "audio/opus",
            "wav" => "audio/wav",
            _ => "*/*",
        }
    }
}
