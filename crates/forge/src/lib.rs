//! Narrative Forge: turn a photo and a short narrative into illustrated
//! comic panels, then export them as an animated image, a print sheet or a
//! narrated video.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use forge::{ForgeConfig, Input, MediaSource, StoryRequest, Studio};
//!
//! # async fn run() -> Result<(), forge::ForgeError> {
//! let studio = Studio::from_config(&ForgeConfig::load()?)?;
//! let photo = Input::Image {
//!     mime: Some("image/jpeg".into()),
//!     source: MediaSource::Binary(std::fs::read("me.jpg").unwrap_or_default()),
//! };
//! let request =
//!     StoryRequest::new(Some(photo), "A brave space explorer", "Wakes up.\nFlies away.");
//!
//! let frames = studio.generate_story(&request, None).await?;
//! let gif = studio.export_gif(&frames).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `forge_error` - error taxonomy
//! - `forge_core` - frames, tasks, script, audio and timeline types
//! - `forge_interface` - gateway and speech traits
//! - `forge_executor` - bounded, retrying, cancellable execution
//! - `forge_models` - Gemini and speech HTTP clients
//! - `forge_narrative` - story orchestration, script and narration
//! - `forge_media` - compositor, muxer and exports
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod studio;

pub use config::ForgeConfig;
pub use studio::{Studio, decoder_for, export_panels};

pub use forge_core::*;
pub use forge_error::*;
pub use forge_executor::{
    AdmissionGate, AdmissionPermit, CancellationToken, ExecutorConfig, ExecutorConfigBuilder,
    GenerationService, TaskExecutor,
};
pub use forge_interface::*;
pub use forge_media::*;
pub use forge_models::{GeminiClient, HttpSpeechClient, ModelsConfig, SpeechConfig};
pub use forge_narrative::*;
