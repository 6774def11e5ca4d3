//! Story orchestration error types.

/// Specific error conditions for story generation and narration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum NarrativeErrorKind {
    /// A required story input was not supplied
    #[display("Missing required input: {}", _0)]
    MissingInput(String),
    /// A story is already being generated
    #[display("A story is already being generated")]
    AlreadyGenerating,
    /// No panel finished successfully
    #[display("No finished panels available")]
    NoFinishedPanels,
    /// Unknown preset name
    #[display("Unknown preset: {}", _0)]
    PresetNotFound(String),
    /// Failed to read a narrative file
    #[display("Failed to read narrative file: {}", _0)]
    FileRead(String),
}

/// Error type for story operations.
///
/// # Examples
///
/// ```
/// use forge_error::{NarrativeError, NarrativeErrorKind};
///
/// let err = NarrativeError::new(NarrativeErrorKind::MissingInput("persona".into()));
/// assert!(format!("{}", err).contains("persona"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Narrative Error: {} at line {} in {}", kind, line, file)]
pub struct NarrativeError {
    /// The kind of error that occurred
    pub kind: NarrativeErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl NarrativeError {
    /// Create a new NarrativeError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NarrativeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
