//! Story orchestration for Narrative Forge.
//!
//! - [`StoryOrchestrator`] turns a persona, a reference photo and a
//!   narrative into illustrated panels on a [`StoryBoard`]
//! - [`ScriptWriter`] derives per-panel dialogue from the finished panels
//! - [`Narrator`] voices that dialogue into [`AudioClip`](forge_core::AudioClip)s
//! - [`presets`] lists the built-in stories

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod board;
mod narrator;
mod orchestrator;
mod presets;
mod prompts;
mod script;
mod voices;

pub use board::{Settlement, StoryBoard};
pub use narrator::Narrator;
pub use orchestrator::{StoryOrchestrator, StoryRequest, narrative_lines};
pub use presets::{DEFAULT_NARRATIVE, DEFAULT_PERSONA, Preset, preset, presets};
pub use prompts::panel_prompt;
pub use script::{ScriptWriter, validate_script};
pub use voices::VoiceTable;
