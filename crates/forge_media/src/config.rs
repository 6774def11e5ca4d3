//! Export settings, loaded from the `[export]` config section.

use forge_core::PcmFormat;
use forge_error::{ConfigError, ForgeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sizes, timings and audio layout used by the exporters.
///
/// # Examples
///
/// ```
/// use forge_media::ExportConfig;
///
/// let config = ExportConfig::default();
/// assert_eq!(*config.gif_frame_ms(), 1500);
/// assert_eq!(config.pcm_format().sample_rate, 24_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Display time of each animated-image frame, in milliseconds.
    #[serde(default = "default_gif_frame_ms")]
    gif_frame_ms: u64,

    /// Edge length of the square animated image.
    #[serde(default = "default_gif_size")]
    gif_size: u32,

    /// Duration of a panel without dialogue, in seconds.
    #[serde(default = "default_panel_secs")]
    default_panel_secs: f64,

    /// Edge length of the square video; must be even.
    #[serde(default = "default_video_size")]
    video_size: u32,

    /// Audio track sample rate.
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,

    /// Audio track channel count.
    #[serde(default = "default_channels")]
    channels: u16,
}

fn default_gif_frame_ms() -> u64 {
    1500
}

fn default_gif_size() -> u32 {
    512
}

fn default_panel_secs() -> f64 {
    2.0
}

fn default_video_size() -> u32 {
    512
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_channels() -> u16 {
    1
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            gif_frame_ms: default_gif_frame_ms(),
            gif_size: default_gif_size(),
            default_panel_secs: default_panel_secs(),
            video_size: default_video_size(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl ExportConfig {
    /// Audio layout of the narration track.
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels)
    }

    /// Animated-image frame delay.
    pub fn gif_frame_delay(&self) -> Duration {
        Duration::from_millis(self.gif_frame_ms)
    }

    /// Override the video edge length.
    pub fn with_video_size(mut self, size: u32) -> Self {
        self.video_size = size;
        self
    }

    /// Override the animated-image edge length.
    pub fn with_gif_size(mut self, size: u32) -> Self {
        self.gif_size = size;
        self
    }

    /// Override the audio layout.
    pub fn with_pcm_format(mut self, format: PcmFormat) -> Self {
        self.sample_rate = format.sample_rate;
        self.channels = format.channels;
        self
    }

    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for zero sizes or rates, an odd video
    /// size, or a non-positive default panel duration.
    pub fn validate(&self) -> ForgeResult<()> {
        if self.gif_frame_ms == 0 || self.gif_size == 0 {
            return Err(
                ConfigError::new("export.gif_frame_ms and export.gif_size must be > 0").into(),
            );
        }
        if self.video_size == 0 || self.video_size % 2 != 0 {
            return Err(ConfigError::new("export.video_size must be a positive even number").into());
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(
                ConfigError::new("export.sample_rate and export.channels must be > 0").into(),
            );
        }
        if !self.default_panel_secs.is_finite() || self.default_panel_secs <= 0.0 {
            return Err(ConfigError::new("export.default_panel_secs must be positive").into());
        }
        Ok(())
    }
}
