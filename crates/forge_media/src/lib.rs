//! Media pipeline for Narrative Forge.
//!
//! - [`Compositor`]: lays panels and narration out on a microsecond timeline
//! - [`Muxer`]: encodes the timeline into a two-track container
//! - [`export_gif`], [`export_sheet`], [`export_video`] and the [`Exporter`]
//!   that serialises them
//! - [`AudioDecoder`]: speech audio to PCM
//!
//! Video output and compressed-audio decoding shell out to the system
//! `ffmpeg` binary; see [`is_ffmpeg_on_path`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compositor;
mod config;
mod decode;
mod export;
mod ffmpeg;
mod imaging;
mod muxer;

pub use compositor::{Compositor, Timeline};
pub use config::ExportConfig;
pub use decode::{AudioDecoder, FfmpegDecoder, Pcm16Decoder};
pub use export::{
    ExportPanel, Exporter, export_gif, export_sheet, export_video, export_video_with,
};
pub use ffmpeg::is_ffmpeg_on_path;
pub use muxer::{
    AudioEncoder, ContainerWriter, EncodedUnit, MemoryContainerWriter, Mp4ContainerWriter, Muxer,
    MuxerState, PCM_PACKET_FRAMES, PcmAudioEncoder, PngVideoEncoder, Track, VideoEncoder,
};
