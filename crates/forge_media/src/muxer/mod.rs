//! Two-track muxing of a composed timeline.

mod container;
mod encoder;
mod unit;

pub use container::{ContainerWriter, MemoryContainerWriter, Mp4ContainerWriter};
pub use encoder::{AudioEncoder, PCM_PACKET_FRAMES, PcmAudioEncoder, PngVideoEncoder, VideoEncoder};
pub use unit::{EncodedUnit, Track};

use forge_core::{EventKind, EventPayload, TimelineEvent};
use forge_error::{MediaError, MediaErrorKind};
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// Lifecycle of a [`Muxer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MuxerState {
    /// Accepting events
    Open,
    /// Both encoders drained; only `finish` is allowed
    Flushed,
    /// Container closed; every call errors
    Finalized,
}

/// Feeds timeline events through a video and an audio encoder and
/// interleaves their units by timestamp into a container.
///
/// `finish` flushes both encoders if that has not happened yet, checks that
/// neither holds output, and finalizes the container exactly once.
///
/// # Examples
///
/// ```
/// use forge_core::{EventKind, EventPayload, PcmFormat, TimelineEvent};
/// use forge_media::{MemoryContainerWriter, Muxer, MuxerState, PcmAudioEncoder, PngVideoEncoder};
///
/// let format = PcmFormat::new(8_000, 1);
/// let mut muxer = Muxer::new(
///     PngVideoEncoder::new(16).unwrap(),
///     PcmAudioEncoder::new(format).unwrap(),
///     MemoryContainerWriter::new(),
/// );
/// muxer.push(&TimelineEvent {
///     kind: EventKind::AudioSamples,
///     panel_index: 1,
///     timestamp_us: 0,
///     duration_us: 62_500,
///     payload: EventPayload::Samples { pcm: vec![0.25; 500], format },
/// }).unwrap();
///
/// muxer.finish().unwrap();
/// assert_eq!(muxer.state(), MuxerState::Finalized);
/// assert_eq!(muxer.writer().units().len(), 1);
/// assert!(muxer.finish().is_err());
/// ```
#[derive(Debug)]
pub struct Muxer<V, A, W> {
    video: V,
    audio: A,
    writer: W,
    state: MuxerState,
    last_video_us: Option<u64>,
    last_audio_us: Option<u64>,
    video_queue: VecDeque<EncodedUnit>,
    audio_queue: VecDeque<EncodedUnit>,
    units_written: usize,
}

impl<V, A, W> Muxer<V, A, W>
where
    V: VideoEncoder,
    A: AudioEncoder,
    W: ContainerWriter,
{
    /// Open muxer over the given encoders and container.
    pub fn new(video: V, audio: A, writer: W) -> Self {
        Self {
            video,
            audio,
            writer,
            state: MuxerState::Open,
            last_video_us: None,
            last_audio_us: None,
            video_queue: VecDeque::new(),
            audio_queue: VecDeque::new(),
            units_written: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MuxerState {
        self.state
    }

    /// The container writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Units handed to the container so far.
    pub fn units_written(&self) -> usize {
        self.units_written
    }

    /// Encode one event.
    ///
    /// # Errors
    ///
    /// `NonMonotonicTimestamp` when the event is earlier than the previous
    /// event of its track, `EncoderRejected` for input after `flush` or a
    /// payload that does not match the event kind, and any encoder or
    /// container failure.
    pub fn push(&mut self, event: &TimelineEvent) -> Result<(), MediaError> {
        match self.state {
            MuxerState::Open => {}
            MuxerState::Flushed => {
                return Err(MediaError::new(MediaErrorKind::EncoderRejected(
                    "muxer was flushed; no further input is accepted".into(),
                )));
            }
            MuxerState::Finalized => return Err(MediaError::new(MediaErrorKind::AlreadyFinalized)),
        }

        let track = Track::from(event.kind);
        let last = match track {
            Track::Video => &mut self.last_video_us,
            Track::Audio => &mut self.last_audio_us,
        };
        if let Some(previous_us) = (*last).filter(|previous| event.timestamp_us < *previous) {
            return Err(MediaError::new(MediaErrorKind::NonMonotonicTimestamp {
                track: track.to_string(),
                previous_us,
                next_us: event.timestamp_us,
            }));
        }
        *last = Some(event.timestamp_us);

        let units = match (&event.kind, &event.payload) {
            (EventKind::VideoFrame, EventPayload::Frame(image)) => {
                self.video.encode(image, event.timestamp_us, event.duration_us)?
            }
            (EventKind::AudioSamples, EventPayload::Samples { pcm, format }) => {
                self.audio.encode(pcm, *format, event.timestamp_us)?
            }
            _ => {
                return Err(MediaError::new(MediaErrorKind::EncoderRejected(format!(
                    "{} event carries the wrong payload",
                    event.kind
                ))));
            }
        };
        self.enqueue(units);
        self.interleave(false)
    }

    /// Encode every event in order.
    pub fn mux<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a TimelineEvent>,
    ) -> Result<(), MediaError> {
        events.into_iter().try_for_each(|event| self.push(event))
    }

    /// Drain both encoders into the container. Idempotent until finalized.
    pub fn flush(&mut self) -> Result<(), MediaError> {
        match self.state {
            MuxerState::Finalized => return Err(MediaError::new(MediaErrorKind::AlreadyFinalized)),
            MuxerState::Flushed => return Ok(()),
            MuxerState::Open => {}
        }
        let video = self.video.flush()?;
        self.enqueue(video);
        let audio = self.audio.flush()?;
        self.enqueue(audio);
        self.interleave(true)?;
        self.state = MuxerState::Flushed;
        Ok(())
    }

    /// Flush if needed, then finalize the container and return its bytes.
    ///
    /// # Errors
    ///
    /// `AlreadyFinalized` on a second call, `PendingOutput` if an encoder
    /// still holds units after flushing, or the container's own failure.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn finish(&mut self) -> Result<Vec<u8>, MediaError> {
        if self.state == MuxerState::Finalized {
            return Err(MediaError::new(MediaErrorKind::AlreadyFinalized));
        }
        if self.state == MuxerState::Open {
            debug!("Flushing encoders before finalize");
            self.flush()?;
        }
        let pending_by_track = [
            (Track::Video, self.video.pending()),
            (Track::Audio, self.audio.pending()),
        ];
        for (track, pending) in pending_by_track {
            if pending > 0 {
                return Err(MediaError::new(MediaErrorKind::PendingOutput {
                    track: track.to_string(),
                    pending,
                }));
            }
        }

        self.state = MuxerState::Finalized;
        let bytes = self.writer.finalize()?;
        debug!(units = self.units_written, bytes = bytes.len(), "Container finalized");
        Ok(bytes)
    }

    fn enqueue(&mut self, units: Vec<EncodedUnit>) {
        for unit in units {
            match unit.track {
                Track::Video => self.video_queue.push_back(unit),
                Track::Audio => self.audio_queue.push_back(unit),
            }
        }
    }

    /// Write queued units in timestamp order, video first on ties. Without
    /// `drain`, a unit is written only once the other track has a later one.
    fn interleave(&mut self, drain: bool) -> Result<(), MediaError> {
        loop {
            let take_video = match (self.video_queue.front(), self.audio_queue.front()) {
                (Some(video), Some(audio)) => video.timestamp_us <= audio.timestamp_us,
                (Some(_), None) if drain => true,
                (None, Some(_)) if drain => false,
                _ => return Ok(()),
            };
            let next = if take_video {
                self.video_queue.pop_front()
            } else {
                self.audio_queue.pop_front()
            };
            if let Some(unit) = next {
                self.writer.write_unit(unit)?;
                self.units_written += 1;
            }
        }
    }
}
