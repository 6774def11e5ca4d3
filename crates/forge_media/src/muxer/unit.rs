//! Encoded units exchanged between encoders, the muxer and containers.

use forge_core::EventKind;

/// Container track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Track {
    /// Still-frame video
    Video,
    /// PCM audio
    Audio,
}

impl From<EventKind> for Track {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::VideoFrame => Track::Video,
            EventKind::AudioSamples => Track::Audio,
        }
    }
}

/// One encoded access unit with its presentation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedUnit {
    /// Track the unit belongs to
    pub track: Track,
    /// Presentation timestamp in microseconds
    pub timestamp_us: u64,
    /// Presentation duration in microseconds
    pub duration_us: u64,
    /// Encoded payload
    pub data: Vec<u8>,
}
