//! Dialogue script extraction from finished panels.

use crate::prompts::{panel_label, script_prompt};
use forge_core::{FrameStatus, ImageData, Input, MediaSource, ScriptEntry, StoryFrame};
use forge_error::{ForgeResult, NarrativeError, NarrativeErrorKind};
use forge_executor::{CancellationToken, GenerationService};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Writes a per-panel dialogue script from the finished panel images in one
/// structured text call.
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    service: Arc<GenerationService>,
}

impl ScriptWriter {
    /// Writer calling through `service`.
    pub fn new(service: Arc<GenerationService>) -> Self {
        Self { service }
    }

    /// Script for `frames`; panel numbers refer to positions among the
    /// frames that finished with an image.
    ///
    /// # Errors
    ///
    /// `NoFinishedPanels` when no frame has an image, otherwise any terminal
    /// executor outcome. Malformed responses are retried.
    #[instrument(skip_all, fields(frames = frames.len()))]
    pub async fn write_script(
        &self,
        frames: &[StoryFrame],
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<Vec<ScriptEntry>> {
        let finished: Vec<(&StoryFrame, &ImageData)> = frames
            .iter()
            .filter(|f| *f.status() == FrameStatus::Done)
            .filter_map(|f| f.output().as_ref().map(|image| (f, image)))
            .collect();
        if finished.is_empty() {
            return Err(NarrativeError::new(NarrativeErrorKind::NoFinishedPanels).into());
        }

        let mut contents = vec![Input::Text(script_prompt(finished.len()))];
        for (offset, (frame, image)) in finished.iter().enumerate() {
            contents.push(Input::Text(panel_label(offset + 1, frame.line())));
            contents.push(Input::Image {
                mime: Some(image.mime.clone()),
                source: MediaSource::Binary(image.bytes.clone()),
            });
        }

        let entries: Vec<ScriptEntry> = self
            .service
            .generate_structured(contents, ScriptEntry::array_schema(), cancel)
            .await?;
        let script = validate_script(entries, finished.len());
        info!(entries = script.len(), "Script written");
        Ok(script)
    }
}

/// Keep entries that reference an existing panel and say something,
/// preserving their order.
///
/// # Examples
///
/// ```
/// use forge_core::ScriptEntry;
/// use forge_narrative::validate_script;
///
/// let script = validate_script(
///     vec![
///         ScriptEntry::new(1, "Captain", "Who's there?"),
///         ScriptEntry::new(4, "Ghost", "Boo."),
///         ScriptEntry::new(2, "Captain", "   "),
///     ],
///     3,
/// );
/// assert_eq!(script.len(), 1);
/// ```
pub fn validate_script(entries: Vec<ScriptEntry>, panel_count: usize) -> Vec<ScriptEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let panel = *entry.panel_index();
            if panel == 0 || panel > panel_count {
                warn!(
                    panel,
                    panel_count,
                    speaker = %entry.speaker(),
                    "Dropping script entry for a missing panel"
                );
                return false;
            }
            if entry.line().trim().is_empty() {
                warn!(panel, speaker = %entry.speaker(), "Dropping empty script line");
                return false;
            }
            true
        })
        .collect()
}
