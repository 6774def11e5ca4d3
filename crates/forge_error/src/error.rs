//! Top-level error wrapper types.

use crate::{
    ConfigError, ExecutorError, ExecutorErrorKind, GatewayError, GatewayErrorKind, HttpError,
    MediaError, NarrativeError, NarrativeErrorKind, RetryableError,
};

/// Every error produced across the forge crates.
///
/// # Examples
///
/// ```
/// use forge_error::{ForgeError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: ForgeError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ForgeErrorKind {
    /// Connection dropped after the response started
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Remote gateway error
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Task executor error
    #[from(ExecutorError)]
    Executor(ExecutorError),
    /// Story orchestration error
    #[from(NarrativeError)]
    Narrative(NarrativeError),
    /// Media pipeline error
    #[from(MediaError)]
    Media(MediaError),
}

/// Coarse classification of a failure, used for reporting and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorCategory {
    /// Dropped connection or transient server status
    #[display("transient network error")]
    TransientNetwork,
    /// An attempt exceeded its deadline
    #[display("timeout")]
    Timeout,
    /// Response arrived but was unusable
    #[display("application rejection")]
    ApplicationRejection,
    /// Caller cancelled the task
    #[display("cancelled")]
    Cancelled,
    /// All attempts were spent
    #[display("permanent exhaustion")]
    PermanentExhaustion,
    /// Media encoding or export failure
    #[display("encoding error")]
    Encoding,
    /// A credential or required input is missing
    #[display("user input missing")]
    UserInputMissing,
    /// Anything else
    #[display("other")]
    Other,
}

/// Forge error with kind discrimination.
///
/// # Examples
///
/// ```
/// use forge_error::{ForgeError, ForgeResult, ConfigError};
///
/// fn might_fail() -> ForgeResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Forge Error: {}", _0)]
pub struct ForgeError(Box<ForgeErrorKind>);

impl ForgeError {
    /// Create a new error from a kind.
    pub fn new(kind: ForgeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ForgeErrorKind {
        &self.0
    }

    /// Classify this error into the failure taxonomy.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_error::{ErrorCategory, ExecutorError, ExecutorErrorKind, ForgeError};
    ///
    /// let err: ForgeError = ExecutorError::new(ExecutorErrorKind::Cancelled).into();
    /// assert_eq!(err.category(), ErrorCategory::Cancelled);
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ForgeErrorKind::Http(_) => ErrorCategory::TransientNetwork,
            ForgeErrorKind::Gateway(e) => match &e.kind {
                GatewayErrorKind::MissingApiKey(_) => ErrorCategory::UserInputMissing,
                kind if kind.is_application_rejection() => ErrorCategory::ApplicationRejection,
                GatewayErrorKind::Transport(_) | GatewayErrorKind::HttpStatus { .. } => {
                    ErrorCategory::TransientNetwork
                }
                _ => ErrorCategory::Other,
            },
            ForgeErrorKind::Executor(e) => match e.kind {
                ExecutorErrorKind::Timeout { .. } => ErrorCategory::Timeout,
                ExecutorErrorKind::Cancelled => ErrorCategory::Cancelled,
                ExecutorErrorKind::Exhausted { .. } => ErrorCategory::PermanentExhaustion,
                ExecutorErrorKind::GateClosed => ErrorCategory::Other,
            },
            ForgeErrorKind::Narrative(e) => match e.kind {
                NarrativeErrorKind::MissingInput(_) => ErrorCategory::UserInputMissing,
                _ => ErrorCategory::Other,
            },
            ForgeErrorKind::Media(_) => ErrorCategory::Encoding,
            ForgeErrorKind::Config(_) => ErrorCategory::Other,
        }
    }

    /// True when the caller's cancellation signal ended the task.
    pub fn is_cancelled(&self) -> bool {
        self.category() == ErrorCategory::Cancelled
    }
}

impl RetryableError for ForgeError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            ForgeErrorKind::Http(_) => true,
            ForgeErrorKind::Gateway(e) => e.is_retryable(),
            ForgeErrorKind::Executor(e) => e.kind.is_retryable(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to ForgeErrorKind
impl<T> From<T> for ForgeError
where
    T: Into<ForgeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for forge operations.
///
/// # Examples
///
/// ```
/// use forge_error::{ForgeResult, HttpError};
///
/// fn read_audio() -> ForgeResult<Vec<u8>> {
///     Err(HttpError::new("stream reset by peer"))?
/// }
/// ```
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;
