//! Looping animated image, one frame per panel.

use super::ExportPanel;
use crate::{ExportConfig, imaging};
use forge_error::{MediaError, MediaErrorKind};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tracing::{debug, instrument};

/// Encode `panels` as an infinitely looping GIF of `gif_size` squares, each
/// shown for `gif_frame_ms`.
///
/// # Errors
///
/// `NothingToExport` for an empty slice, `ImageDecode`/`ImageEncode` for
/// unreadable panels or encoder failures.
#[instrument(skip_all, fields(panels = panels.len(), size = *config.gif_size()))]
pub fn export_gif(panels: &[ExportPanel], config: &ExportConfig) -> Result<Vec<u8>, MediaError> {
    if panels.is_empty() {
        return Err(MediaError::new(MediaErrorKind::NothingToExport));
    }
    let delay_ms = u32::try_from(*config.gif_frame_ms()).unwrap_or(u32::MAX);
    let encode_err =
        |e: image::ImageError| MediaError::new(MediaErrorKind::ImageEncode(e.to_string()));

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_err)?;
        for panel in panels {
            let image = imaging::letterbox(&imaging::decode(&panel.image)?, *config.gif_size());
            let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder.encode_frame(frame).map_err(encode_err)?;
        }
    }
    debug!(bytes = bytes.len(), "Encoded GIF");
    Ok(bytes)
}
