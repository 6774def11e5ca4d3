//! Wiring of providers, executor, orchestration and exports from a
//! [`ForgeConfig`].

use crate::ForgeConfig;
use forge_core::{AudioClip, PcmFormat, ScriptEntry, StoryFrame};
use forge_error::ForgeResult;
use forge_executor::{CancellationToken, GenerationService, TaskExecutor};
use forge_media::{AudioDecoder, ExportPanel, Exporter, FfmpegDecoder, Pcm16Decoder};
use forge_models::{GeminiClient, HttpSpeechClient, SpeechConfig};
use forge_narrative::{Narrator, ScriptWriter, StoryOrchestrator, StoryRequest};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Everything a story run needs, sharing one executor.
#[derive(Debug, Clone)]
pub struct Studio {
    service: Arc<GenerationService>,
    orchestrator: StoryOrchestrator,
    script_writer: ScriptWriter,
    narrator: Arc<Narrator>,
    exporter: Exporter,
}

impl Studio {
    /// Build against the live services.
    ///
    /// # Errors
    ///
    /// `MissingApiKey` when the Gemini key is unset, or an invalid executor
    /// configuration. A missing speech key only disables narration.
    #[instrument(skip_all)]
    pub fn from_config(config: &ForgeConfig) -> ForgeResult<Self> {
        config.validate()?;
        let driver = GeminiClient::from_env(config.models().clone())?;
        let executor = TaskExecutor::new(config.executor().clone())?;
        let mut service = GenerationService::new(Arc::new(driver), executor)
            .with_image_model(config.models().image())
            .with_text_model(config.models().text());

        match HttpSpeechClient::from_env(config.speech().clone()) {
            Ok(speech) => service = service.with_speech(Arc::new(speech)),
            Err(e) => warn!(error = %e, "Narration disabled"),
        }

        let decoder = decoder_for(config.speech(), config.export().pcm_format());
        Ok(Self::new(Arc::new(service), decoder, Exporter::new(config.export().clone())))
    }

    /// Assemble from parts.
    pub fn new(
        service: Arc<GenerationService>,
        decoder: Arc<dyn AudioDecoder>,
        exporter: Exporter,
    ) -> Self {
        Self {
            orchestrator: StoryOrchestrator::new(Arc::clone(&service)),
            script_writer: ScriptWriter::new(Arc::clone(&service)),
            narrator: Arc::new(Narrator::new(Arc::clone(&service), decoder)),
            service,
            exporter,
        }
    }

    /// Shared generation service.
    pub fn service(&self) -> &Arc<GenerationService> {
        &self.service
    }

    /// Story orchestrator.
    pub fn orchestrator(&self) -> &StoryOrchestrator {
        &self.orchestrator
    }

    /// Export front end.
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Generate the panels for `request`.
    pub async fn generate_story(
        &self,
        request: &StoryRequest,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<Vec<StoryFrame>> {
        self.orchestrator.generate_story(request, cancel).await
    }

    /// Script and narration for the finished `frames`.
    ///
    /// Returns no clips when speech is not configured; the video then shows
    /// every panel for the default duration.
    #[instrument(skip_all, fields(frames = frames.len()))]
    pub async fn narrate(
        &self,
        frames: &[StoryFrame],
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<(Vec<ScriptEntry>, Vec<AudioClip>)> {
        if !self.service.has_speech() {
            info!("No speech synthesizer, exporting a silent video");
            return Ok((Vec::new(), Vec::new()));
        }
        let script = self.script_writer.write_script(frames, cancel).await?;
        let clips = self.narrator.narrate(&script, cancel).await?;
        Ok((script, clips))
    }

    /// Animated image of the finished frames.
    pub async fn export_gif(&self, frames: &[StoryFrame]) -> ForgeResult<Vec<u8>> {
        self.exporter.gif(export_panels(frames)).await
    }

    /// Captioned print sheet of the finished frames.
    pub async fn export_sheet(&self, frames: &[StoryFrame]) -> ForgeResult<Vec<u8>> {
        self.exporter.sheet(export_panels(frames)).await
    }

    /// Narrated video of the finished frames.
    pub async fn export_video(
        &self,
        frames: &[StoryFrame],
        clips: Vec<AudioClip>,
    ) -> ForgeResult<Vec<u8>> {
        self.exporter.video(export_panels(frames), clips).await
    }
}

/// Finished frames as export panels captioned with their narrative line.
pub fn export_panels(frames: &[StoryFrame]) -> Vec<ExportPanel> {
    frames
        .iter()
        .filter_map(|frame| {
            frame
                .output()
                .as_ref()
                .map(|image| ExportPanel::new(image.clone(), frame.line().as_str()))
        })
        .collect()
}

/// Raw PCM at the export rate skips ffmpeg; anything else is decoded by it.
///
/// # Examples
///
/// ```
/// use forge::decoder_for;
/// use forge_core::PcmFormat;
/// use forge_models::SpeechConfig;
///
/// let decoder = decoder_for(&SpeechConfig::default(), PcmFormat::new(24_000, 1));
/// assert_eq!(decoder.format(), PcmFormat::new(24_000, 1));
/// ```
pub fn decoder_for(speech: &SpeechConfig, format: PcmFormat) -> Arc<dyn AudioDecoder> {
    let raw_rate = speech
        .output_format()
        .strip_prefix("pcm_")
        .and_then(|rate| rate.parse::<u32>().ok());
    match raw_rate {
        Some(rate) if rate == format.sample_rate && format.channels == 1 => {
            Arc::new(Pcm16Decoder::new(format))
        }
        _ => Arc::new(FfmpegDecoder::new(format)),
    }
}
