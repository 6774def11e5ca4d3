//! Service contracts for Narrative Forge.
//!
//! - [`ForgeDriver`]: one remote generation call (image or text path)
//! - [`SpeechSynthesis`]: streamed text-to-speech
//! - response checks that turn incomplete responses into retryable rejections

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod traits;

pub use extraction::{collect_audio, first_image, response_text};
pub use traits::{AudioStream, ForgeDriver, SpeechSynthesis};
