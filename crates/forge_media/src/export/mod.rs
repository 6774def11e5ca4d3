//! Story exports: animated image, print sheet and narrated video.

mod gif;
mod sheet;

pub use gif::export_gif;
pub use sheet::export_sheet;

use crate::{
    Compositor, ContainerWriter, ExportConfig, Mp4ContainerWriter, Muxer, PcmAudioEncoder,
    PngVideoEncoder,
};
use forge_core::{AudioClip, ImageData};
use forge_error::{ForgeResult, MediaError, MediaErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument, warn};

/// A finished panel and the caption printed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPanel {
    /// Panel image
    pub image: ImageData,
    /// Caption, usually the narrative line
    pub caption: String,
}

impl ExportPanel {
    /// Pair an image with its caption.
    pub fn new(image: ImageData, caption: impl Into<String>) -> Self {
        Self {
            image,
            caption: caption.into(),
        }
    }
}

/// Compose and mux `panels` with `clips` into `writer`, returning its bytes.
///
/// # Errors
///
/// Any compositor, encoder or container failure.
pub fn export_video_with<W: ContainerWriter>(
    panels: &[ExportPanel],
    clips: &[AudioClip],
    config: &ExportConfig,
    writer: W,
) -> Result<Vec<u8>, MediaError> {
    if panels.is_empty() {
        return Err(MediaError::new(MediaErrorKind::NothingToExport));
    }
    let images: Vec<ImageData> = panels.iter().map(|p| p.image.clone()).collect();
    let timeline = Compositor::new(*config.default_panel_secs()).compose(&images, clips)?;

    let mut muxer = Muxer::new(
        PngVideoEncoder::new(*config.video_size())?,
        PcmAudioEncoder::new(config.pcm_format())?,
        writer,
    );
    muxer.mux(timeline.events())?;
    muxer.finish()
}

/// Narrated MP4 of `panels` and `clips`, encoded with `ffmpeg`.
pub fn export_video(
    panels: &[ExportPanel],
    clips: &[AudioClip],
    config: &ExportConfig,
) -> Result<Vec<u8>, MediaError> {
    export_video_with(panels, clips, config, Mp4ContainerWriter::new(config.pcm_format())?)
}

/// Clears the busy flag when an export ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs exports one at a time off the async runtime.
///
/// A second export requested while one is running is refused with
/// `ExportBusy`; the flag is cleared on success and on failure alike.
#[derive(Debug, Clone)]
pub struct Exporter {
    config: Arc<ExportConfig>,
    busy: Arc<AtomicBool>,
}

impl Exporter {
    /// Exporter using `config`.
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config: Arc::new(config),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Settings in use.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether an export is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard, MediaError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MediaError::new(MediaErrorKind::ExportBusy))?;
        Ok(BusyGuard(Arc::clone(&self.busy)))
    }

    async fn run<F>(&self, kind: &'static str, job: F) -> ForgeResult<Vec<u8>>
    where
        F: FnOnce(&ExportConfig) -> Result<Vec<u8>, MediaError> + Send + 'static,
    {
        let _guard = self.acquire()?;
        let config = Arc::clone(&self.config);
        let result = tokio::task::spawn_blocking(move || job(&config))
            .await
            .map_err(|e| {
                let reason = format!("{kind} export task failed: {e}");
                MediaError::new(MediaErrorKind::EncoderRejected(reason))
            })?;
        match result {
            Ok(bytes) => {
                info!(kind, bytes = bytes.len(), "Export finished");
                Ok(bytes)
            }
            Err(e) => {
                warn!(kind, error = %e, "Export failed");
                Err(e.into())
            }
        }
    }

    /// Animated image of `panels`.
    #[instrument(skip_all, fields(panels = panels.len()))]
    pub async fn gif(&self, panels: Vec<ExportPanel>) -> ForgeResult<Vec<u8>> {
        self.run("gif", move |config| export_gif(&panels, config)).await
    }

    /// Print sheet of `panels`.
    #[instrument(skip_all, fields(panels = panels.len()))]
    pub async fn sheet(&self, panels: Vec<ExportPanel>) -> ForgeResult<Vec<u8>> {
        self.run("sheet", move |config| export_sheet(&panels, config)).await
    }

    /// Narrated MP4 of `panels` and `clips`.
    #[instrument(skip_all, fields(panels = panels.len(), clips = clips.len()))]
    pub async fn video(
        &self,
        panels: Vec<ExportPanel>,
        clips: Vec<AudioClip>,
    ) -> ForgeResult<Vec<u8>> {
        self.run("video", move |config| export_video(&panels, &clips, config)).await
    }

    /// Narrated video muxed into a caller-supplied container.
    pub async fn video_with<W>(
        &self,
        panels: Vec<ExportPanel>,
        clips: Vec<AudioClip>,
        writer: W,
    ) -> ForgeResult<Vec<u8>>
    where
        W: ContainerWriter + 'static,
    {
        self.run("video", move |config| export_video_with(&panels, &clips, config, writer)).await
    }
}
