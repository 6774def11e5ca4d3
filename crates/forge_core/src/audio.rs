//! Decoded audio clips.

use serde::{Deserialize, Serialize};

/// Sample rate and channel layout of interleaved `f32` PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl PcmFormat {
    /// Create a format description.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Duration in seconds of `sample_count` interleaved samples.
    pub fn seconds_for(&self, sample_count: usize) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let frames = sample_count / self.channels as usize;
        frames as f64 / self.sample_rate as f64
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::new(24_000, 1)
    }
}

/// Decoded speech for one script entry.
///
/// # Examples
///
/// ```
/// use forge_core::{AudioClip, PcmFormat};
///
/// let clip = AudioClip::from_pcm(2, vec![0.0; 36_000], PcmFormat::new(24_000, 1));
/// assert!((clip.duration_seconds() - 1.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct AudioClip {
    /// 1-based panel the clip belongs to
    panel_index: usize,
    /// Interleaved PCM samples
    samples: Vec<f32>,
    /// Layout of `samples`
    format: PcmFormat,
    /// Playback length
    duration_seconds: f64,
}

impl AudioClip {
    /// Build a clip from decoded PCM, deriving its duration from the sample count.
    pub fn from_pcm(panel_index: usize, samples: Vec<f32>, format: PcmFormat) -> Self {
        let duration_seconds = format.seconds_for(samples.len());
        Self {
            panel_index,
            samples,
            format,
            duration_seconds,
        }
    }

    /// Consume the clip, returning its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}
