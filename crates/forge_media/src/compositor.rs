//! Panel/audio timeline composition.

use forge_core::{
    AudioClip, EventKind, EventPayload, ImageData, PcmFormat, TimelineEvent, secs_to_micros,
};
use forge_error::{MediaError, MediaErrorKind};
use tracing::{debug, instrument};

/// Composed events plus the length of each track.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct Timeline {
    /// Events ordered by timestamp, video before audio on ties
    events: Vec<TimelineEvent>,
    /// End of the last video frame
    video_end_us: u64,
    /// End of the last audio run
    audio_end_us: u64,
    /// Audio layout, when any audio is present
    audio_format: Option<PcmFormat>,
}

impl Timeline {
    /// Consume the timeline, returning its events.
    pub fn into_events(self) -> Vec<TimelineEvent> {
        self.events
    }
}

/// Turns ordered panels and their narration into timeline events.
///
/// Each panel is shown for as long as its clips play back to back, or for
/// the default duration when it has no narration. Durations are summed in
/// floating-point seconds and rounded to microseconds only when emitted, so
/// long stories do not drift.
///
/// # Examples
///
/// ```
/// use forge_core::{AudioClip, ImageData, PcmFormat};
/// use forge_media::Compositor;
///
/// let panels = vec![ImageData::new("image/png", vec![1]), ImageData::new("image/png", vec![2])];
/// let clips = vec![AudioClip::from_pcm(2, vec![0.0; 12_000], PcmFormat::new(24_000, 1))];
///
/// let timeline = Compositor::new(2.0).compose(&panels, &clips).unwrap();
/// assert_eq!(*timeline.video_end_us(), 2_500_000);
/// assert_eq!(*timeline.audio_end_us(), 500_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    default_panel_secs: f64,
}

impl Compositor {
    /// Compositor using `default_panel_secs` for panels without narration.
    pub fn new(default_panel_secs: f64) -> Self {
        Self { default_panel_secs }
    }

    /// Compose `panels` (in story order) with `clips` (in script order).
    ///
    /// # Errors
    ///
    /// `InvalidPanel` for a clip outside `1..=panels.len()`, and
    /// `UnsupportedParameters` for clips whose layout differs from the first
    /// clip or whose samples are not channel-aligned.
    #[instrument(skip_all, fields(panels = panels.len(), clips = clips.len()))]
    pub fn compose(
        &self,
        panels: &[ImageData],
        clips: &[AudioClip],
    ) -> Result<Timeline, MediaError> {
        let audio_format = validate_clips(panels.len(), clips)?;

        let mut events = Vec::with_capacity(panels.len() * 2);
        let mut video_clock = 0.0_f64;
        let mut audio_clock = 0.0_f64;

        for (offset, image) in panels.iter().enumerate() {
            let panel_index = offset + 1;
            let panel_clips: Vec<&AudioClip> = clips
                .iter()
                .filter(|clip| *clip.panel_index() == panel_index)
                .collect();

            let spoken: f64 = panel_clips.iter().map(|clip| *clip.duration_seconds()).sum();
            let duration = if spoken > 0.0 { spoken } else { self.default_panel_secs };

            events.push(TimelineEvent {
                kind: EventKind::VideoFrame,
                panel_index,
                timestamp_us: secs_to_micros(video_clock),
                duration_us: secs_to_micros(duration),
                payload: EventPayload::Frame(image.clone()),
            });

            if let Some(format) = audio_format.filter(|_| spoken > 0.0) {
                let pcm: Vec<f32> = panel_clips
                    .iter()
                    .flat_map(|clip| clip.samples().iter().copied())
                    .collect();
                events.push(TimelineEvent {
                    kind: EventKind::AudioSamples,
                    panel_index,
                    timestamp_us: secs_to_micros(audio_clock),
                    duration_us: secs_to_micros(spoken),
                    payload: EventPayload::Samples { pcm, format },
                });
                audio_clock += spoken;
            }

            debug!(
                panel = panel_index,
                duration_secs = duration,
                clips = panel_clips.len(),
                "Placed panel"
            );
            video_clock += duration;
        }

        events.sort_by_key(|event| (event.timestamp_us, event.kind));

        Ok(Timeline {
            events,
            video_end_us: secs_to_micros(video_clock),
            audio_end_us: secs_to_micros(audio_clock),
            audio_format,
        })
    }
}

fn validate_clips(
    panel_count: usize,
    clips: &[AudioClip],
) -> Result<Option<PcmFormat>, MediaError> {
    let mut format: Option<PcmFormat> = None;
    for clip in clips {
        let panel = *clip.panel_index();
        if panel == 0 || panel > panel_count {
            return Err(MediaError::new(MediaErrorKind::InvalidPanel { panel, panel_count }));
        }
        let clip_format = *clip.format();
        let channels = usize::from(clip_format.channels);
        if channels == 0 || clip.samples().len() % channels != 0 {
            return Err(MediaError::new(MediaErrorKind::UnsupportedParameters(format!(
                "clip for panel {panel} is not aligned to {} channels",
                clip_format.channels
            ))));
        }
        match format {
            None => format = Some(clip_format),
            Some(existing) if existing != clip_format => {
                return Err(MediaError::new(MediaErrorKind::UnsupportedParameters(format!(
                    "clip for panel {panel} is {}Hz/{}ch, track is {}Hz/{}ch",
                    clip_format.sample_rate,
                    clip_format.channels,
                    existing.sample_rate,
                    existing.channels
                ))));
            }
            Some(_) => {}
        }
    }
    Ok(format)
}
