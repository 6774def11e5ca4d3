//! Video and audio encoders feeding the muxer.

use super::{EncodedUnit, Track};
use crate::imaging;
use forge_core::{ImageData, PcmFormat, secs_to_micros};
use forge_error::{MediaError, MediaErrorKind};

/// Encodes still frames with explicit durations.
pub trait VideoEncoder: Send {
    /// Accept one frame, returning any units that are now complete.
    fn encode(
        &mut self,
        image: &ImageData,
        timestamp_us: u64,
        duration_us: u64,
    ) -> Result<Vec<EncodedUnit>, MediaError>;

    /// Emit every buffered unit.
    fn flush(&mut self) -> Result<Vec<EncodedUnit>, MediaError>;

    /// Units held back and not yet emitted.
    fn pending(&self) -> usize;
}

/// Encodes interleaved PCM at a fixed sample rate and channel count.
pub trait AudioEncoder: Send {
    /// Accept a run of samples, returning any units that are now complete.
    fn encode(
        &mut self,
        pcm: &[f32],
        format: PcmFormat,
        timestamp_us: u64,
    ) -> Result<Vec<EncodedUnit>, MediaError>;

    /// Emit every buffered unit.
    fn flush(&mut self) -> Result<Vec<EncodedUnit>, MediaError>;

    /// Units held back and not yet emitted.
    fn pending(&self) -> usize;
}

// ─── VIDEO ───

/// Letterboxes panels to a square PNG frame.
///
/// The most recent frame is held until the next one arrives (or `flush`),
/// so a frame is only emitted once nothing can change it.
#[derive(Debug)]
pub struct PngVideoEncoder {
    size: u32,
    held: Option<EncodedUnit>,
}

impl PngVideoEncoder {
    /// Encoder producing `size`x`size` frames.
    ///
    /// # Errors
    ///
    /// `UnsupportedParameters` unless `size` is positive and even.
    pub fn new(size: u32) -> Result<Self, MediaError> {
        if size == 0 || size % 2 != 0 {
            return Err(MediaError::new(MediaErrorKind::UnsupportedParameters(format!(
                "video size must be a positive even number, got {size}"
            ))));
        }
        Ok(Self { size, held: None })
    }

    /// Frame edge length.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl VideoEncoder for PngVideoEncoder {
    fn encode(
        &mut self,
        image: &ImageData,
        timestamp_us: u64,
        duration_us: u64,
    ) -> Result<Vec<EncodedUnit>, MediaError> {
        let decoded = imaging::decode(image)
            .map_err(|e| MediaError::new(MediaErrorKind::EncoderRejected(e.kind.to_string())))?;
        let data = imaging::encode_png(imaging::letterbox(&decoded, self.size))?;
        let next = EncodedUnit {
            track: Track::Video,
            timestamp_us,
            duration_us,
            data,
        };
        Ok(self.held.replace(next).into_iter().collect())
    }

    fn flush(&mut self) -> Result<Vec<EncodedUnit>, MediaError> {
        Ok(self.held.take().into_iter().collect())
    }

    fn pending(&self) -> usize {
        usize::from(self.held.is_some())
    }
}

// ─── AUDIO ───

/// Frames per audio packet.
pub const PCM_PACKET_FRAMES: usize = 1024;

/// Packetises PCM into fixed-size little-endian `f32` packets.
///
/// A run's timestamp is snapped to the nearest frame of the track. A run that
/// starts after the buffered audio is preceded by silence, or rebases the
/// track when nothing is buffered; a run that starts before it overlaps
/// audio already accepted and is rejected. The final partial packet is
/// zero-padded on `flush`.
#[derive(Debug)]
pub struct PcmAudioEncoder {
    format: PcmFormat,
    buffer: Vec<f32>,
    base_us: u64,
    frames_emitted: u64,
}

impl PcmAudioEncoder {
    /// Encoder accepting only `format`.
    ///
    /// # Errors
    ///
    /// `UnsupportedParameters` for a zero sample rate or channel count.
    pub fn new(format: PcmFormat) -> Result<Self, MediaError> {
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(MediaError::new(MediaErrorKind::UnsupportedParameters(format!(
                "audio format {}Hz/{}ch is not usable",
                format.sample_rate, format.channels
            ))));
        }
        Ok(Self {
            format,
            buffer: Vec::new(),
            base_us: 0,
            frames_emitted: 0,
        })
    }

    /// Accepted layout.
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    fn packet_len(&self) -> usize {
        PCM_PACKET_FRAMES * usize::from(self.format.channels)
    }

    fn position_us(&self) -> u64 {
        let emitted_secs = self.frames_emitted as f64 / f64::from(self.format.sample_rate);
        self.base_us + secs_to_micros(emitted_secs)
    }

    /// Frames accepted since `base_us`, emitted or still buffered.
    fn cursor_frames(&self) -> u64 {
        self.frames_emitted + (self.buffer.len() / usize::from(self.format.channels)) as u64
    }

    /// Frame offset of `timestamp_us` from `base_us`, or `None` before it.
    fn frame_at(&self, timestamp_us: u64) -> Option<u64> {
        let offset_us = timestamp_us.checked_sub(self.base_us)?;
        let frames = offset_us as f64 * f64::from(self.format.sample_rate) / 1_000_000.0;
        Some(frames.round() as u64)
    }

    /// Places the next run at `timestamp_us`, padding or rebasing over a gap.
    fn align_to(&mut self, timestamp_us: u64) -> Result<(), MediaError> {
        let cursor = self.cursor_frames();
        match self.frame_at(timestamp_us) {
            Some(target) if target == cursor => Ok(()),
            Some(target) if target > cursor && !self.buffer.is_empty() => {
                let silence = (target - cursor) as usize * usize::from(self.format.channels);
                self.buffer.resize(self.buffer.len() + silence, 0.0);
                Ok(())
            }
            Some(target) if target > cursor => {
                self.base_us = timestamp_us;
                self.frames_emitted = 0;
                Ok(())
            }
            _ => Err(MediaError::new(MediaErrorKind::EncoderRejected(format!(
                "audio at {timestamp_us}us overlaps audio already accepted up to {}us",
                self.base_us
                    + secs_to_micros(cursor as f64 / f64::from(self.format.sample_rate))
            )))),
        }
    }

    fn packet(&mut self, samples: Vec<f32>) -> EncodedUnit {
        let timestamp_us = self.position_us();
        self.frames_emitted += PCM_PACKET_FRAMES as u64;
        EncodedUnit {
            track: Track::Audio,
            timestamp_us,
            duration_us: self.position_us() - timestamp_us,
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }
}

impl AudioEncoder for PcmAudioEncoder {
    fn encode(
        &mut self,
        pcm: &[f32],
        format: PcmFormat,
        timestamp_us: u64,
    ) -> Result<Vec<EncodedUnit>, MediaError> {
        if format != self.format {
            return Err(MediaError::new(MediaErrorKind::UnsupportedParameters(format!(
                "audio encoder expects {}Hz/{}ch, got {}Hz/{}ch",
                self.format.sample_rate, self.format.channels, format.sample_rate, format.channels
            ))));
        }
        if pcm.len() % usize::from(format.channels) != 0 {
            return Err(MediaError::new(MediaErrorKind::EncoderRejected(format!(
                "{} samples is not a whole number of {}-channel frames",
                pcm.len(),
                format.channels
            ))));
        }

        self.align_to(timestamp_us)?;
        self.buffer.extend_from_slice(pcm);

        let packet_len = self.packet_len();
        let mut units = Vec::with_capacity(self.buffer.len() / packet_len);
        while self.buffer.len() >= packet_len {
            let samples: Vec<f32> = self.buffer.drain(..packet_len).collect();
            units.push(self.packet(samples));
        }
        Ok(units)
    }

    fn flush(&mut self) -> Result<Vec<EncodedUnit>, MediaError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let mut samples = std::mem::take(&mut self.buffer);
        samples.resize(self.packet_len(), 0.0);
        Ok(vec![self.packet(samples)])
    }

    fn pending(&self) -> usize {
        usize::from(!self.buffer.is_empty())
    }
}
