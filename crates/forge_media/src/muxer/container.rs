//! Container writers receiving interleaved units.

use super::{EncodedUnit, Track};
use crate::ffmpeg;
use forge_core::PcmFormat;
use forge_error::{MediaError, MediaErrorKind};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Sink for interleaved units producing one immutable output buffer.
pub trait ContainerWriter: Send {
    /// Append one unit.
    fn write_unit(&mut self, unit: EncodedUnit) -> Result<(), MediaError>;

    /// Close the container and return its bytes. Called at most once.
    fn finalize(&mut self) -> Result<Vec<u8>, MediaError>;
}

// ─── MEMORY ───

/// Records units in memory; the output is the concatenated unit payloads.
#[derive(Debug, Default)]
pub struct MemoryContainerWriter {
    units: Vec<EncodedUnit>,
    finalize_calls: usize,
}

impl MemoryContainerWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units received, in write order.
    pub fn units(&self) -> &[EncodedUnit] {
        &self.units
    }

    /// Units of one track, in write order.
    pub fn track_units(&self, track: Track) -> impl Iterator<Item = &EncodedUnit> {
        self.units.iter().filter(move |u| u.track == track)
    }

    /// Number of `finalize` calls seen.
    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls
    }
}

impl ContainerWriter for MemoryContainerWriter {
    fn write_unit(&mut self, unit: EncodedUnit) -> Result<(), MediaError> {
        if self.finalize_calls > 0 {
            return Err(MediaError::new(MediaErrorKind::AlreadyFinalized));
        }
        self.units.push(unit);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Vec<u8>, MediaError> {
        self.finalize_calls += 1;
        if self.finalize_calls > 1 {
            return Err(MediaError::new(MediaErrorKind::AlreadyFinalized));
        }
        Ok(self.units.iter().flat_map(|u| u.data.iter().copied()).collect())
    }
}

// ─── MP4 ───

/// Video frame rate of the MP4 output; still frames are repeated to fill it.
const OUTPUT_FPS: u32 = 25;

/// Writes an H.264/AAC MP4 through the system `ffmpeg` binary.
///
/// PNG video units are staged as numbered files described by a concat list
/// carrying each frame's duration; `f32le` audio units are appended to one raw
/// stream, with silence written over any gap between units. `finalize` runs
/// `ffmpeg` once and reads the result back.
#[derive(Debug)]
pub struct Mp4ContainerWriter {
    staging: tempfile::TempDir,
    audio_format: PcmFormat,
    frames: Vec<(String, u64)>,
    audio: Option<BufWriter<File>>,
    audio_start_us: Option<u64>,
    audio_frames: u64,
    finalized: bool,
}

impl Mp4ContainerWriter {
    /// Writer whose audio track uses `audio_format`.
    ///
    /// # Errors
    ///
    /// `FfmpegNotFound` if `ffmpeg` cannot be launched, or an I/O error
    /// creating the staging directory.
    pub fn new(audio_format: PcmFormat) -> Result<Self, MediaError> {
        if !ffmpeg::is_ffmpeg_on_path() {
            return Err(MediaError::new(MediaErrorKind::FfmpegNotFound));
        }
        let staging = tempfile::Builder::new().prefix("forge-mux-").tempdir()?;
        Ok(Self {
            staging,
            audio_format,
            frames: Vec::new(),
            audio: None,
            audio_start_us: None,
            audio_frames: 0,
            finalized: false,
        })
    }

    fn staged(&self, name: &str) -> PathBuf {
        self.staging.path().join(name)
    }

    fn concat_list(&self) -> String {
        let mut list = String::from("ffconcat version 1.0\n");
        for (name, duration_us) in &self.frames {
            list.push_str(&format!(
                "file '{name}'\nduration {:.6}\n",
                *duration_us as f64 / 1_000_000.0
            ));
        }
        // The concat demuxer drops the last entry's duration unless the file repeats.
        if let Some((name, _)) = self.frames.last() {
            list.push_str(&format!("file '{name}'\n"));
        }
        list
    }

    /// Appends one audio unit to the raw stream, filling a gap before it with silence.
    fn write_audio(&mut self, unit: &EncodedUnit) -> Result<(), MediaError> {
        let frame_bytes = 4 * usize::from(self.audio_format.channels);
        if unit.data.len() % frame_bytes != 0 {
            return Err(MediaError::new(MediaErrorKind::EncoderRejected(format!(
                "audio unit of {} bytes is not a whole number of frames",
                unit.data.len()
            ))));
        }
        let start_us = *self.audio_start_us.get_or_insert(unit.timestamp_us);
        let offset_us = unit.timestamp_us.saturating_sub(start_us);
        let target = (offset_us as f64 * f64::from(self.audio_format.sample_rate) / 1_000_000.0)
            .round() as u64;
        if unit.timestamp_us < start_us || target < self.audio_frames {
            return Err(MediaError::new(MediaErrorKind::EncoderRejected(format!(
                "audio unit at {}us overlaps the audio already written",
                unit.timestamp_us
            ))));
        }

        if self.audio.is_none() {
            let file = File::create(self.staged("audio.f32le"))?;
            self.audio = Some(BufWriter::new(file));
        }
        if let Some(audio) = self.audio.as_mut() {
            let gap = (target - self.audio_frames) as usize;
            if gap > 0 {
                debug!(frames = gap, at_us = unit.timestamp_us, "Filling audio gap with silence");
                audio.write_all(&vec![0u8; gap * frame_bytes])?;
            }
            audio.write_all(&unit.data)?;
        }
        self.audio_frames = target + (unit.data.len() / frame_bytes) as u64;
        Ok(())
    }
}

impl ContainerWriter for Mp4ContainerWriter {
    fn write_unit(&mut self, unit: EncodedUnit) -> Result<(), MediaError> {
        if self.finalized {
            return Err(MediaError::new(MediaErrorKind::AlreadyFinalized));
        }
        match unit.track {
            Track::Video => {
                let name = format!("frame_{:05}.png", self.frames.len());
                std::fs::write(self.staged(&name), &unit.data)?;
                self.frames.push((name, unit.duration_us));
            }
            Track::Audio => self.write_audio(&unit)?,
        }
        Ok(())
    }

    #[instrument(skip(self), fields(frames = self.frames.len(), audio = self.audio.is_some()))]
    fn finalize(&mut self) -> Result<Vec<u8>, MediaError> {
        if self.finalized {
            return Err(MediaError::new(MediaErrorKind::AlreadyFinalized));
        }
        self.finalized = true;
        if self.frames.is_empty() {
            return Err(MediaError::new(MediaErrorKind::NothingToExport));
        }
        if let Some(mut audio) = self.audio.take() {
            audio.flush()?;
        }

        let list = self.staged("frames.ffconcat");
        std::fs::write(&list, self.concat_list())?;
        let output = self.staged("story.mp4");

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list.display().to_string(),
        ];
        if let Some(start_us) = self.audio_start_us {
            args.extend([
                "-itsoffset".into(),
                format!("{:.6}", start_us as f64 / 1_000_000.0),
                "-f".into(),
                "f32le".into(),
                "-ar".into(),
                self.audio_format.sample_rate.to_string(),
                "-ac".into(),
                self.audio_format.channels.to_string(),
                "-i".into(),
                self.staged("audio.f32le").display().to_string(),
                "-c:a".into(),
                "aac".into(),
            ]);
        }
        args.extend([
            "-vf".into(),
            format!("fps={OUTPUT_FPS}"),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-movflags".into(),
            "+faststart".into(),
            output.display().to_string(),
        ]);

        ffmpeg::run(&args)?;
        let bytes = std::fs::read(&output)?;
        debug!(bytes = bytes.len(), "Wrote MP4 container");
        Ok(bytes)
    }
}
