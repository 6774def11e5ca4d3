//! Generation task units.

use crate::{FrameId, Input};
use std::time::Duration;

/// One request unit owned by the executor while in flight.
///
/// # Examples
///
/// ```
/// use forge_core::{FrameId, GenerationTask};
/// use std::time::Duration;
///
/// let task =
///     GenerationTask::new(FrameId::new(), "Draw a ghost ship", None, Duration::from_secs(5));
/// assert_eq!(*task.attempts_made(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct GenerationTask {
    /// Correlation id, shared with the frame it serves
    id: FrameId,
    /// Prompt text
    prompt: String,
    /// Optional reference image
    reference: Option<Input>,
    /// Per-attempt deadline
    deadline: Duration,
    /// Attempts started so far
    attempts_made: u32,
}

impl GenerationTask {
    /// Create a task that has not been attempted yet.
    pub fn new(
        id: FrameId,
        prompt: impl Into<String>,
        reference: Option<Input>,
        deadline: Duration,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            reference,
            deadline,
            attempts_made: 0,
        }
    }

    /// Record the start of another attempt, returning its zero-based index.
    pub fn begin_attempt(&mut self) -> u32 {
        let attempt = self.attempts_made;
        self.attempts_made += 1;
        attempt
    }
}
