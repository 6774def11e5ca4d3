//! Core data types for Narrative Forge.
//!
//! This crate provides the value types shared by the executor, the story
//! orchestrator and the media pipeline: generation requests and responses,
//! story frames and their lifecycle, script entries, decoded audio clips and
//! timeline events.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audio;
mod frame;
mod input;
mod media;
mod output;
mod request;
mod script;
mod task;
mod timeline;

pub use audio::{AudioClip, PcmFormat};
pub use frame::{FrameId, FrameStatus, StoryFrame};
pub use input::Input;
pub use media::{ImageData, MediaSource};
pub use output::Output;
pub use request::{Candidate, GenerateRequest, GenerateRequestBuilder, GenerateResponse, Modality};
pub use script::ScriptEntry;
pub use task::GenerationTask;
pub use timeline::{EventKind, EventPayload, TimelineEvent, secs_to_micros};
