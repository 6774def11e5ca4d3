//! Speech audio decoding to interleaved `f32` PCM.

use crate::ffmpeg;
use async_trait::async_trait;
use forge_core::PcmFormat;
use forge_error::{ForgeResult, MediaError, MediaErrorKind};
use std::io::Write;
use tracing::{debug, instrument};

/// Decodes a synthesized audio buffer into PCM with a fixed layout.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decode `encoded` into interleaved samples in [`format`](Self::format).
    async fn decode(&self, encoded: Vec<u8>) -> ForgeResult<Vec<f32>>;

    /// Layout of the decoded samples.
    fn format(&self) -> PcmFormat;
}

/// Decodes any container/codec `ffmpeg` understands, resampling to `format`.
#[derive(Debug, Clone, Copy)]
pub struct FfmpegDecoder {
    format: PcmFormat,
}

impl FfmpegDecoder {
    /// Decoder producing `format`.
    pub fn new(format: PcmFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl AudioDecoder for FfmpegDecoder {
    #[instrument(skip_all, fields(bytes = encoded.len()))]
    async fn decode(&self, encoded: Vec<u8>) -> ForgeResult<Vec<f32>> {
        if encoded.is_empty() {
            let empty = MediaErrorKind::AudioDecode("empty audio payload".into());
            return Err(MediaError::new(empty).into());
        }
        let format = self.format;
        let samples = tokio::task::spawn_blocking(move || decode_with_ffmpeg(&encoded, format))
            .await
            .map_err(|e| {
                MediaError::new(MediaErrorKind::AudioDecode(format!("decode task failed: {e}")))
            })??;
        debug!(samples = samples.len(), "Decoded speech audio");
        Ok(samples)
    }

    fn format(&self) -> PcmFormat {
        self.format
    }
}

fn decode_with_ffmpeg(encoded: &[u8], format: PcmFormat) -> Result<Vec<f32>, MediaError> {
    let mut input = tempfile::Builder::new().prefix("forge-speech-").tempfile()?;
    input.write_all(encoded)?;
    input.flush()?;

    let args = vec![
        "-i".to_string(),
        input.path().display().to_string(),
        "-vn".into(),
        "-f".into(),
        "f32le".into(),
        "-acodec".into(),
        "pcm_f32le".into(),
        "-ac".into(),
        format.channels.to_string(),
        "-ar".into(),
        format.sample_rate.to_string(),
        "pipe:1".into(),
    ];
    let raw = ffmpeg::run(&args)?;
    f32_from_le_bytes(&raw)
}

/// Interpret raw little-endian `f32` bytes.
fn f32_from_le_bytes(raw: &[u8]) -> Result<Vec<f32>, MediaError> {
    if raw.len() % 4 != 0 {
        return Err(MediaError::new(MediaErrorKind::AudioDecode(
            "decoded audio byte length is not aligned to f32 samples".into(),
        )));
    }
    Ok(raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decodes raw signed 16-bit little-endian PCM, as returned by the speech
/// service's `pcm_<rate>` output formats. Needs no external tools.
///
/// # Examples
///
/// ```
/// # tokio_test_block(async {
/// use forge_core::PcmFormat;
/// use forge_media::{AudioDecoder, Pcm16Decoder};
///
/// let decoder = Pcm16Decoder::new(PcmFormat::new(24_000, 1));
/// let samples = decoder.decode(vec![0x00, 0x40, 0x00, 0xC0]).await.unwrap();
/// assert_eq!(samples, vec![0.5, -0.5]);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pcm16Decoder {
    format: PcmFormat,
}

impl Pcm16Decoder {
    /// Decoder for PCM already in `format`.
    pub fn new(format: PcmFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl AudioDecoder for Pcm16Decoder {
    async fn decode(&self, encoded: Vec<u8>) -> ForgeResult<Vec<f32>> {
        let channels = usize::from(self.format.channels.max(1));
        if encoded.len() % (2 * channels) != 0 {
            return Err(MediaError::new(MediaErrorKind::AudioDecode(format!(
                "{} bytes is not a whole number of {}-channel s16 frames",
                encoded.len(),
                channels
            )))
            .into());
        }
        Ok(encoded
            .chunks_exact(2)
            .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32_768.0)
            .collect())
    }

    fn format(&self) -> PcmFormat {
        self.format
    }
}
