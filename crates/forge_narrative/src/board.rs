//! Per-frame story state table.

use forge_core::{FrameId, FrameStatus, ImageData, StoryFrame};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Terminal outcome applied to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Generation produced an image
    Done(ImageData),
    /// Generation failed permanently
    Failed,
}

/// One generation's frames: line order plus one independently locked slot
/// per id.
#[derive(Debug, Default)]
struct Generation {
    order: Vec<FrameId>,
    slots: HashMap<FrameId, RwLock<StoryFrame>>,
}

impl Generation {
    fn read(&self, id: &FrameId) -> Option<StoryFrame> {
        self.slots
            .get(id)
            .map(|slot| slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn update<F>(&self, id: &FrameId, apply: F) -> bool
    where
        F: FnOnce(&mut StoryFrame) -> bool,
    {
        match self.slots.get(id) {
            Some(slot) => apply(&mut *slot.write().unwrap_or_else(PoisonError::into_inner)),
            None => false,
        }
    }
}

/// Canonical story state: the frames of the current generation in line order.
///
/// Each frame sits behind its own lock, so settling one frame never waits on
/// another. `reset` swaps in a whole new generation; settlements for ids of
/// an earlier generation find no slot and are discarded.
///
/// # Examples
///
/// ```
/// use forge_core::{FrameStatus, ImageData, StoryFrame};
/// use forge_narrative::{Settlement, StoryBoard};
///
/// let board = StoryBoard::new();
/// let ids = board.reset(vec![StoryFrame::new("line", "prompt")]);
/// assert!(board.mark_in_flight(&ids[0]));
/// assert!(board.settle(&ids[0], Settlement::Done(ImageData::new("image/png", vec![1]))));
///
/// let old = ids[0];
/// board.reset(vec![StoryFrame::new("line", "prompt")]);
/// assert!(!board.settle(&old, Settlement::Failed));
/// assert_eq!(*board.snapshot()[0].status(), FrameStatus::Pending);
/// ```
#[derive(Debug, Default)]
pub struct StoryBoard {
    current: RwLock<Arc<Generation>>,
}

impl StoryBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace every frame with `frames`, returning their ids in order.
    pub fn reset(&self, frames: Vec<StoryFrame>) -> Vec<FrameId> {
        let order: Vec<FrameId> = frames.iter().map(|f| *f.id()).collect();
        let slots = frames
            .into_iter()
            .map(|frame| (*frame.id(), RwLock::new(frame)))
            .collect();
        let next = Arc::new(Generation {
            order: order.clone(),
            slots,
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
        debug!(frames = order.len(), "Story board reset");
        order
    }

    /// Number of frames in the current generation.
    pub fn len(&self) -> usize {
        self.generation().order.len()
    }

    /// Whether the board holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of one frame.
    pub fn get(&self, id: &FrameId) -> Option<StoryFrame> {
        self.generation().read(id)
    }

    /// Copy of every frame, in line order.
    pub fn snapshot(&self) -> Vec<StoryFrame> {
        let generation = self.generation();
        generation
            .order
            .iter()
            .filter_map(|id| generation.read(id))
            .collect()
    }

    /// Frames that finished with an image, in line order.
    pub fn finished(&self) -> Vec<StoryFrame> {
        self.snapshot()
            .into_iter()
            .filter(|f| *f.status() == FrameStatus::Done && f.output().is_some())
            .collect()
    }

    /// Whether every frame has settled.
    pub fn is_settled(&self) -> bool {
        self.snapshot().iter().all(|f| f.status().is_terminal())
    }

    /// `Pending -> InFlight` for `id`; false for unknown ids or other states.
    pub fn mark_in_flight(&self, id: &FrameId) -> bool {
        self.generation().update(id, StoryFrame::mark_in_flight)
    }

    /// Apply a terminal outcome to `id`.
    ///
    /// Returns false when `id` is not part of the current generation or has
    /// already settled.
    pub fn settle(&self, id: &FrameId, settlement: Settlement) -> bool {
        self.generation().update(id, |frame| match settlement {
            Settlement::Done(image) => frame.complete(image),
            Settlement::Failed => frame.fail(),
        })
    }
}
