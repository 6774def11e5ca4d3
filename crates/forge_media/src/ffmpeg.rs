//! Thin wrappers around the system `ffmpeg` binary.
//!
//! The binary is used instead of linking FFmpeg so the workspace builds
//! without native development headers.

use forge_error::{MediaError, MediaErrorKind};
use std::process::{Command, Stdio};
use tracing::debug;

/// Whether an `ffmpeg` binary can be launched.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `ffmpeg` with `args`, returning its stdout.
///
/// Blocking; call from `spawn_blocking` inside async code.
pub(crate) fn run(args: &[String]) -> Result<Vec<u8>, MediaError> {
    debug!(args = ?args, "Running ffmpeg");
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(args)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::new(MediaErrorKind::FfmpegNotFound)
            } else {
                MediaError::new(MediaErrorKind::Ffmpeg(format!("failed to spawn ffmpeg: {e}")))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::new(MediaErrorKind::Ffmpeg(format!(
            "exited with status {}: {}",
            output.status,
            stderr.trim()
        ))));
    }
    Ok(output.stdout)
}
