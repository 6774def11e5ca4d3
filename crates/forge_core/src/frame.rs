//! Story frame lifecycle records.

use crate::ImageData;
use serde::{Deserialize, Serialize};

/// Unique identifier of one story frame and the task generating it.
///
/// A fresh id is minted for every frame of every run, so settlements from a
/// previous run can never match a frame of the current one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{}", _0)]
pub struct FrameId(uuid::Uuid);

impl FrameId {
    /// Mint a new random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a story frame.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum FrameStatus {
    /// Created, not yet dispatched
    Pending,
    /// Dispatched to the executor
    InFlight,
    /// Settled with an image
    Done,
    /// Settled without an image
    Failed,
}

impl FrameStatus {
    /// Whether the frame has settled.
    pub fn is_terminal(self) -> bool {
        matches!(self, FrameStatus::Done | FrameStatus::Failed)
    }
}

/// One narrative line's lifecycle record.
///
/// Transitions are `Pending -> InFlight -> Done | Failed`; the transition
/// methods return `false` and leave the frame untouched when called out of
/// order.
///
/// # Examples
///
/// ```
/// use forge_core::{FrameStatus, ImageData, StoryFrame};
///
/// let mut frame = StoryFrame::new("Escapes in their spaceship.", "Illustrate ...");
/// assert_eq!(*frame.status(), FrameStatus::Pending);
///
/// assert!(frame.mark_in_flight());
/// assert!(frame.complete(ImageData::new("image/png", vec![1, 2, 3])));
/// assert_eq!(*frame.status(), FrameStatus::Done);
///
/// // A frame settles exactly once.
/// assert!(!frame.fail());
/// assert!(frame.output().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StoryFrame {
    /// Unique id of this frame
    id: FrameId,
    /// Narrative line this frame illustrates
    line: String,
    /// Prompt sent to the image model
    prompt: String,
    /// Current lifecycle state
    status: FrameStatus,
    /// Generated image once `Done`
    output: Option<ImageData>,
}

impl StoryFrame {
    /// Create a `Pending` frame with a fresh id.
    pub fn new(line: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(),
            line: line.into(),
            prompt: prompt.into(),
            status: FrameStatus::Pending,
            output: None,
        }
    }

    /// `Pending -> InFlight`.
    pub fn mark_in_flight(&mut self) -> bool {
        if self.status != FrameStatus::Pending {
            return false;
        }
        self.status = FrameStatus::InFlight;
        true
    }

    /// `InFlight -> Done`, storing the image.
    pub fn complete(&mut self, image: ImageData) -> bool {
        if self.status != FrameStatus::InFlight {
            return false;
        }
        self.status = FrameStatus::Done;
        self.output = Some(image);
        true
    }

    /// `InFlight -> Failed`; the output stays empty.
    pub fn fail(&mut self) -> bool {
        if self.status != FrameStatus::InFlight {
            return false;
        }
        self.status = FrameStatus::Failed;
        self.output = None;
        true
    }
}
