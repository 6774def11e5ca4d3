//! Remote generation gateway errors and retry classification.

/// Failure conditions reported by the generative service boundary.
///
/// Variants split into three groups: missing user input (never retried),
/// transport/status failures (retried when transient) and application-level
/// rejections of an otherwise successful response (always retried within
/// the attempt budget).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GatewayErrorKind {
    /// Required credential not found in the environment
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// Request never produced an HTTP response
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Response body could not be decoded
    #[display("Invalid response body: {}", _0)]
    InvalidResponse(String),
    /// Response carried no candidates
    #[display("No candidates returned")]
    NoCandidates,
    /// Candidate had no content, usually a safety block
    #[display("Candidate returned no content (finish reason: {})", finish_reason)]
    ContentBlocked {
        /// Finish reason reported by the service
        finish_reason: String,
    },
    /// Image path returned content without inline image data
    #[display("No image data found in response")]
    NoImageData,
    /// Text path returned an empty body
    #[display("Response text was empty")]
    EmptyText,
    /// Structured text did not match the requested shape
    #[display("Structured response did not match schema: {}", _0)]
    MalformedStructure(String),
    /// Base64 payload in the response could not be decoded
    #[display("Base64 decode error: {}", _0)]
    Base64Decode(String),
    /// Reference media supplied by the caller is unusable
    #[display("Invalid reference media: {}", _0)]
    InvalidReference(String),
}

impl GatewayErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayErrorKind::MissingApiKey(_) | GatewayErrorKind::InvalidReference(_) => false,
            GatewayErrorKind::HttpStatus { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500..=599)
            }
            GatewayErrorKind::Transport(_)
            | GatewayErrorKind::InvalidResponse(_)
            | GatewayErrorKind::NoCandidates
            | GatewayErrorKind::ContentBlocked { .. }
            | GatewayErrorKind::NoImageData
            | GatewayErrorKind::EmptyText
            | GatewayErrorKind::MalformedStructure(_)
            | GatewayErrorKind::Base64Decode(_) => true,
        }
    }

    /// True for rejections of a response that arrived intact.
    pub fn is_application_rejection(&self) -> bool {
        matches!(
            self,
            GatewayErrorKind::NoCandidates
                | GatewayErrorKind::ContentBlocked { .. }
                | GatewayErrorKind::NoImageData
                | GatewayErrorKind::EmptyText
                | GatewayErrorKind::MalformedStructure(_)
        )
    }
}

/// Gateway error with source location tracking.
///
/// # Examples
///
/// ```
/// use forge_error::{GatewayError, GatewayErrorKind, RetryableError};
///
/// let err = GatewayError::new(GatewayErrorKind::MissingApiKey("GEMINI_API_KEY".into()));
/// assert!(format!("{}", err).contains("GEMINI_API_KEY"));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    /// The kind of error that occurred
    pub kind: GatewayErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GatewayError {
    /// Create a new GatewayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use forge_error::{GatewayError, GatewayErrorKind, RetryableError};
///
/// let err = GatewayError::new(GatewayErrorKind::HttpStatus {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = GatewayError::new(GatewayErrorKind::HttpStatus {
///     status_code: 401,
///     message: "Unauthorized".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger another attempt.
    ///
    /// Transient errors like 503, 429, dropped connections and rejected
    /// candidates return true. Permanent errors like 401 or a missing
    /// credential return false.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for GatewayError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
