//! Script narration: speech synthesis and decoding per script entry.

use crate::VoiceTable;
use forge_core::{AudioClip, ScriptEntry};
use forge_error::{ExecutorError, ExecutorErrorKind, ForgeResult};
use forge_executor::{CancellationToken, GenerationService};
use forge_media::AudioDecoder;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Voices every script entry and decodes the result into clips.
///
/// Entries are synthesized concurrently through the shared executor; the
/// clips come back in script order. A line that cannot be voiced or decoded
/// is logged and skipped.
pub struct Narrator {
    service: Arc<GenerationService>,
    decoder: Arc<dyn AudioDecoder>,
    voices: VoiceTable,
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("service", &self.service)
            .field("format", &self.decoder.format())
            .field("voices", &self.voices)
            .finish()
    }
}

impl Narrator {
    /// Narrator using the default voice table.
    pub fn new(service: Arc<GenerationService>, decoder: Arc<dyn AudioDecoder>) -> Self {
        Self {
            service,
            decoder,
            voices: VoiceTable::default(),
        }
    }

    /// Replace the voice table.
    pub fn with_voices(mut self, voices: VoiceTable) -> Self {
        self.voices = voices;
        self
    }

    /// Voice table in use.
    pub fn voices(&self) -> &VoiceTable {
        &self.voices
    }

    /// Clips for `script`, in script order.
    ///
    /// # Errors
    ///
    /// `Cancelled` if `cancel` fired; individual line failures are skipped.
    #[instrument(skip_all, fields(entries = script.len()))]
    pub async fn narrate(
        &self,
        script: &[ScriptEntry],
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<Vec<AudioClip>> {
        let voiced = join_all(script.iter().map(|entry| self.voice(entry, cancel))).await;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(ExecutorError::new(ExecutorErrorKind::Cancelled).into());
        }

        let clips: Vec<AudioClip> = script
            .iter()
            .zip(voiced)
            .filter_map(|(entry, result)| match result {
                Ok(clip) => Some(clip),
                Err(e) => {
                    warn!(
                        panel = *entry.panel_index(),
                        speaker = %entry.speaker(),
                        error = %e,
                        "Skipping line that could not be narrated"
                    );
                    None
                }
            })
            .collect();
        debug!(clips = clips.len(), "Narration complete");
        Ok(clips)
    }

    async fn voice(
        &self,
        entry: &ScriptEntry,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<AudioClip> {
        let voice_id = self.voices.voice_for(entry.speaker());
        let encoded = self
            .service
            .synthesize_speech(voice_id, entry.line(), cancel)
            .await?;
        let samples = self.decoder.decode(encoded).await?;
        Ok(AudioClip::from_pcm(*entry.panel_index(), samples, self.decoder.format()))
    }
}
