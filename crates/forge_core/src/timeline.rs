//! Timeline events shared by the compositor and the muxer.

use crate::{ImageData, PcmFormat};

/// Convert floating-point seconds to whole microseconds, rounding to nearest.
///
/// # Examples
///
/// ```
/// use forge_core::secs_to_micros;
///
/// assert_eq!(secs_to_micros(1.2), 1_200_000);
/// assert_eq!(secs_to_micros(0.000_000_6), 1);
/// assert_eq!(secs_to_micros(-3.0), 0);
/// ```
pub fn secs_to_micros(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1_000_000.0).round() as u64
}

/// Track an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// A still frame shown for `duration_us`
    VideoFrame,
    /// A run of PCM samples
    AudioSamples,
}

/// Payload carried by a timeline event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Encoded panel image
    Frame(ImageData),
    /// Interleaved PCM samples
    Samples {
        /// Sample data
        pcm: Vec<f32>,
        /// Layout of `pcm`
        format: PcmFormat,
    },
}

/// One event of the composed timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    /// Track of this event
    pub kind: EventKind,
    /// 1-based panel index
    pub panel_index: usize,
    /// Microseconds since start
    pub timestamp_us: u64,
    /// Length in microseconds
    pub duration_us: u64,
    /// Event data
    pub payload: EventPayload,
}

impl TimelineEvent {
    /// End of the event in microseconds.
    pub fn end_us(&self) -> u64 {
        self.timestamp_us + self.duration_us
    }
}
