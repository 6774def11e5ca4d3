//! Media encoding and export errors.

/// Failure conditions of the compositor, muxer and exporters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum MediaErrorKind {
    /// ffmpeg binary is not on PATH
    #[display("ffmpeg not found on PATH")]
    FfmpegNotFound,
    /// ffmpeg exited unsuccessfully
    #[display("ffmpeg failed: {}", _0)]
    Ffmpeg(String),
    /// Audio payload could not be decoded
    #[display("Audio decode failed: {}", _0)]
    AudioDecode(String),
    /// Image payload could not be decoded
    #[display("Image decode failed: {}", _0)]
    ImageDecode(String),
    /// Image could not be encoded
    #[display("Image encode failed: {}", _0)]
    ImageEncode(String),
    /// Caption rasterisation failed
    #[display("Caption render failed: {}", _0)]
    CaptionRender(String),
    /// An encoder refused an input unit
    #[display("Encoder rejected input: {}", _0)]
    EncoderRejected(String),
    /// Encoder or container parameters are not usable
    #[display("Unsupported parameters: {}", _0)]
    UnsupportedParameters(String),
    /// A unit arrived out of timestamp order for its track
    #[display("Non-monotonic {} timestamp: {}us after {}us", track, next_us, previous_us)]
    NonMonotonicTimestamp {
        /// Track name
        track: String,
        /// Last accepted timestamp
        previous_us: u64,
        /// Rejected timestamp
        next_us: u64,
    },
    /// A unit or clip referenced a panel that does not exist
    #[display("Panel {} out of range (1..={})", panel, panel_count)]
    InvalidPanel {
        /// 1-based panel index
        panel: usize,
        /// Number of panels
        panel_count: usize,
    },
    /// The container was already finalized
    #[display("Container already finalized")]
    AlreadyFinalized,
    /// An encoder still held buffered output at finalize time
    #[display("{} encoder still has {} pending units", track, pending)]
    PendingOutput {
        /// Track name
        track: String,
        /// Units left in the encoder
        pending: usize,
    },
    /// Another export is running
    #[display("An export is already in progress")]
    ExportBusy,
    /// There were no finished panels to export
    #[display("Nothing to export")]
    NothingToExport,
    /// Filesystem failure
    #[display("I/O error: {}", _0)]
    Io(String),
}

/// Media error with source location tracking.
///
/// # Examples
///
/// ```
/// use forge_error::{MediaError, MediaErrorKind};
///
/// let err = MediaError::new(MediaErrorKind::AlreadyFinalized);
/// assert!(format!("{}", err).contains("finalized"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Media Error: {} at line {} in {}", kind, line, file)]
pub struct MediaError {
    /// The kind of error that occurred
    pub kind: MediaErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl MediaError {
    /// Create a new MediaError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MediaErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<std::io::Error> for MediaError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(MediaErrorKind::Io(err.to_string()))
    }
}
