//! Task executor errors.

/// Terminal and per-attempt outcomes produced by the task executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExecutorErrorKind {
    /// A single attempt outlived its deadline
    #[display("Attempt {} timed out after {}ms", attempt, timeout_ms)]
    Timeout {
        /// Zero-based attempt index
        attempt: u32,
        /// Deadline that elapsed
        timeout_ms: u64,
    },
    /// The caller's cancellation signal fired
    #[display("Task cancelled")]
    Cancelled,
    /// Every allowed attempt failed
    #[display("Gave up after {} attempts: {}", attempts, last_error)]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Message of the final attempt's failure
        last_error: String,
    },
    /// The admission gate was shut down
    #[display("Admission gate closed")]
    GateClosed,
}

impl ExecutorErrorKind {
    /// Only a timed-out attempt is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorErrorKind::Timeout { .. })
    }
}

/// Executor error with source location tracking.
///
/// # Examples
///
/// ```
/// use forge_error::{ExecutorError, ExecutorErrorKind};
///
/// let err = ExecutorError::new(ExecutorErrorKind::Cancelled);
/// assert!(format!("{}", err).contains("cancelled"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Executor Error: {} at line {} in {}", kind, line, file)]
pub struct ExecutorError {
    /// The kind of error that occurred
    pub kind: ExecutorErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExecutorError {
    /// Create a new ExecutorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExecutorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
