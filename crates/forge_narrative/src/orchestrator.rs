//! Story generation: one illustrated panel per narrative line.

use crate::board::{Settlement, StoryBoard};
use crate::prompts::panel_prompt;
use forge_core::{FrameId, GenerationTask, Input, StoryFrame};
use forge_error::{ForgeResult, NarrativeError, NarrativeErrorKind};
use forge_executor::{CancellationToken, GenerationService};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument};

/// Inputs of one story run.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct StoryRequest {
    /// Reference photo of the main character
    reference: Option<Input>,
    /// Main character description
    persona: String,
    /// Story beats, one per line
    narrative: String,
}

impl StoryRequest {
    /// Bundle the story inputs.
    pub fn new(
        reference: Option<Input>,
        persona: impl Into<String>,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            reference,
            persona: persona.into(),
            narrative: narrative.into(),
        }
    }

    /// Trimmed, non-empty narrative lines in order.
    pub fn lines(&self) -> Vec<String> {
        narrative_lines(&self.narrative)
    }

    fn validate(&self) -> ForgeResult<(&Input, Vec<String>)> {
        let missing =
            |what: &str| NarrativeError::new(NarrativeErrorKind::MissingInput(what.to_string()));
        let reference = self.reference.as_ref().ok_or_else(|| missing("base image"))?;
        if self.persona.trim().is_empty() {
            return Err(missing("persona").into());
        }
        let lines = self.lines();
        if lines.is_empty() {
            return Err(missing("narrative").into());
        }
        Ok((reference, lines))
    }
}

/// Split a narrative into trimmed, non-empty lines.
///
/// # Examples
///
/// ```
/// let lines = forge_narrative::narrative_lines("  Wakes up.\n\n Runs away. \n");
/// assert_eq!(lines, vec!["Wakes up.", "Runs away."]);
/// ```
pub fn narrative_lines(narrative: &str) -> Vec<String> {
    narrative
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Clears the generating flag when a run ends, however it ends.
struct GeneratingGuard(Arc<AtomicBool>);

impl Drop for GeneratingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fans a narrative out into concurrent image generations and collects the
/// results on a [`StoryBoard`].
///
/// A frame's failure is logged and recorded as `Failed`; it never aborts
/// its siblings. Only one run may be active at a time.
#[derive(Debug, Clone)]
pub struct StoryOrchestrator {
    service: Arc<GenerationService>,
    board: Arc<StoryBoard>,
    generating: Arc<AtomicBool>,
}

impl StoryOrchestrator {
    /// Orchestrator dispatching through `service`.
    pub fn new(service: Arc<GenerationService>) -> Self {
        Self {
            service,
            board: Arc::new(StoryBoard::new()),
            generating: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The story state.
    pub fn board(&self) -> &Arc<StoryBoard> {
        &self.board
    }

    /// Whether a run is in progress.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Generate one panel per narrative line and return the settled frames
    /// in line order.
    ///
    /// Previous frames are discarded and every frame gets a fresh id.
    ///
    /// # Errors
    ///
    /// `MissingInput` when the reference image, persona or narrative is
    /// absent (nothing is dispatched), `AlreadyGenerating` while another run
    /// is active. Per-frame failures are not errors.
    #[instrument(skip_all, fields(persona = %request.persona()))]
    pub async fn generate_story(
        &self,
        request: &StoryRequest,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<Vec<StoryFrame>> {
        let (reference, lines) = request.validate()?;

        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| NarrativeError::new(NarrativeErrorKind::AlreadyGenerating))?;
        let _guard = GeneratingGuard(Arc::clone(&self.generating));

        let frames: Vec<StoryFrame> = lines
            .iter()
            .map(|line| StoryFrame::new(line.as_str(), panel_prompt(request.persona(), line)))
            .collect();
        let prompts: Vec<String> = frames.iter().map(|f| f.prompt().clone()).collect();
        let ids = self.board.reset(frames);
        for id in &ids {
            self.board.mark_in_flight(id);
        }
        info!(frames = ids.len(), "Dispatching story frames");

        let deadline = self.service.executor().config().timeout();
        let runs = ids.iter().zip(prompts).map(|(id, prompt)| {
            let task = GenerationTask::new(*id, prompt, Some(reference.clone()), deadline);
            self.run_frame(*id, task, cancel)
        });
        join_all(runs).await;

        let snapshot = self.board.snapshot();
        info!(
            done = snapshot.iter().filter(|f| f.output().is_some()).count(),
            total = snapshot.len(),
            "Story generation finished"
        );
        Ok(snapshot)
    }

    async fn run_frame(
        &self,
        id: FrameId,
        task: GenerationTask,
        cancel: Option<&CancellationToken>,
    ) {
        let settlement = match self.service.generate_image(task, cancel).await {
            Ok(image) => {
                debug!(frame_id = %id, bytes = image.bytes.len(), "Frame done");
                Settlement::Done(image)
            }
            Err(e) => {
                error!(frame_id = %id, error = %e, "Failed to generate frame");
                Settlement::Failed
            }
        };
        if !self.board.settle(&id, settlement) {
            debug!(frame_id = %id, "Discarding settlement for a frame that is no longer current");
        }
    }
}
