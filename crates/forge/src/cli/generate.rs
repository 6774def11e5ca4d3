//! `forge generate` and `forge presets`.

use super::GenerateArgs;
use anyhow::Context;
use forge::{
    CancellationToken, DEFAULT_NARRATIVE, DEFAULT_PERSONA, ForgeConfig, FrameStatus, Input,
    MediaSource, NarrativeError, NarrativeErrorKind, StoryFrame, StoryRequest, Studio,
    is_ffmpeg_on_path, preset, presets,
};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Print the built-in presets.
pub fn list_presets() {
    for preset in presets() {
        println!("{} {} ({})", preset.emoji, preset.name, preset.key);
        println!("   persona: {}", preset.persona);
        for line in preset.lines {
            println!("   - {line}");
        }
    }
}

/// Run a story and write the panels and requested exports to `args.out`.
pub async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ForgeConfig::from_file(path)?,
        None => ForgeConfig::load()?,
    };
    let request = story_request(&args)?;
    let studio = Studio::from_config(&config)?;

    if args.video && !is_ffmpeg_on_path() {
        anyhow::bail!("--video needs ffmpeg on PATH");
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning outstanding work");
                cancel.cancel();
            }
        });
    }

    let frames = studio.generate_story(&request, Some(&cancel)).await?;
    write_panels(&args.out, &frames)?;
    print_summary(&frames);

    if !frames.iter().any(|f| f.output().is_some()) {
        anyhow::bail!("No panel was generated; nothing to export");
    }

    if args.gif {
        let gif = studio.export_gif(&frames).await?;
        write_atomic(&args.out.join("story.gif"), &gif)?;
    }
    if args.sheet {
        let sheet = studio.export_sheet(&frames).await?;
        write_atomic(&args.out.join("story_sheet.png"), &sheet)?;
    }
    if args.video {
        let (script, clips) = studio.narrate(&frames, Some(&cancel)).await?;
        for entry in &script {
            println!("[{}] {}: {}", entry.panel_index(), entry.speaker(), entry.line());
        }
        let video = studio.export_video(&frames, clips).await?;
        write_atomic(&args.out.join("story.mp4"), &video)?;
    }

    info!(out = %args.out.display(), "Done");
    Ok(())
}

fn story_request(args: &GenerateArgs) -> anyhow::Result<StoryRequest> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let reference = Input::Image {
        mime: Some(mime_for(&args.image).to_string()),
        source: MediaSource::Binary(bytes),
    };

    let preset = args.preset.as_deref().map(preset).transpose()?;
    let narrative = match (&args.narrative, preset) {
        (Some(path), _) => std::fs::read_to_string(path).map_err(|e| {
            NarrativeError::new(NarrativeErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?,
        (None, Some(preset)) => preset.narrative(),
        (None, None) => DEFAULT_NARRATIVE.to_string(),
    };
    let persona = args
        .persona
        .clone()
        .or_else(|| preset.map(|p| p.persona.to_string()))
        .unwrap_or_else(|| DEFAULT_PERSONA.to_string());

    Ok(StoryRequest::new(Some(reference), persona, narrative))
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

fn write_panels(out: &Path, frames: &[StoryFrame]) -> anyhow::Result<()> {
    for (index, frame) in frames.iter().enumerate() {
        if let Some(image) = frame.output() {
            let name = format!("panel_{:02}.{}", index + 1, extension_for(&image.mime));
            write_atomic(&out.join(name), &image.bytes)?;
        }
    }
    Ok(())
}

/// Write through a sibling temp file so a failed write never leaves a
/// truncated artifact behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to stage {}", path.display()))?;
    file.write_all(bytes)?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn print_summary(frames: &[StoryFrame]) {
    for (index, frame) in frames.iter().enumerate() {
        let mark = match frame.status() {
            FrameStatus::Done => "done",
            FrameStatus::Failed => "FAILED",
            FrameStatus::Pending | FrameStatus::InFlight => "unsettled",
        };
        println!("{:>2}. [{mark}] {}", index + 1, frame.line());
    }
}
