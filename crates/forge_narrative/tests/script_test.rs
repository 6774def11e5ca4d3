//! Tests for script writing and narration.

mod test_utils;

use forge_core::{FrameStatus, ImageData, Input, MediaSource, ScriptEntry, StoryFrame};
use forge_error::{ErrorCategory, ForgeError, ForgeErrorKind, NarrativeErrorKind};
use forge_executor::CancellationToken;
use forge_narrative::{Narrator, ScriptWriter, VoiceTable, preset, presets};
use std::sync::Arc;
use test_utils::{MockDecoder, MockDriver, MockResponse, MockSpeech, PNG, SAMPLES_PER_BYTE};

fn frame(line: &str, image: Option<&[u8]>) -> StoryFrame {
    let mut frame = StoryFrame::new(line, format!("Illustrate {line}"));
    frame.mark_in_flight();
    match image {
        Some(bytes) => frame.complete(ImageData::new("image/png", bytes.to_vec())),
        None => frame.fail(),
    };
    frame
}

fn narrative_kind(err: &ForgeError) -> Option<&NarrativeErrorKind> {
    match err.kind() {
        ForgeErrorKind::Narrative(e) => Some(&e.kind),
        _ => None,
    }
}

const SCRIPT: &str = r#"```json
[
  {"panel": 1, "speaker": "Narrator", "line": "It began with a signal."},
  {"panel": 2, "speaker": "Captain", "line": "Hold steady."},
  {"panel": 3, "speaker": "Ghost", "line": "There is no panel three."},
  {"panel": 2, "speaker": "Alien", "line": "  "}
]
```"#;

#[tokio::test]
async fn test_script_uses_finished_panels_only() -> anyhow::Result<()> {
    let driver = MockDriver::new(MockResponse::Text(SCRIPT.to_string()));
    let writer = ScriptWriter::new(test_utils::service(&driver)?);
    let frames = vec![
        frame("A signal arrives.", Some(b"one")),
        frame("The engine explodes.", None),
        frame("The crew braces.", Some(b"two")),
    ];

    let script = writer.write_script(&frames, None).await?;

    assert_eq!(
        script,
        vec![
            ScriptEntry::new(1, "Narrator", "It began with a signal."),
            ScriptEntry::new(2, "Captain", "Hold steady."),
        ]
    );

    let requests = driver.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.response_schema.is_some());
    assert_eq!(request.contents.len(), 5);
    match &request.contents[0] {
        Input::Text(prompt) => assert!(prompt.contains("2-panel comic")),
        other => anyhow::bail!("unexpected instruction {other:?}"),
    }
    assert_eq!(request.contents[1], Input::Text("Panel 1: A signal arrives.".to_string()));
    assert_eq!(
        request.contents[2],
        Input::Image {
            mime: Some("image/png".to_string()),
            source: MediaSource::Binary(b"one".to_vec()),
        }
    );
    assert_eq!(request.contents[3], Input::Text("Panel 2: The crew braces.".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_negative_panel_entry_is_dropped() -> anyhow::Result<()> {
    let script = r#"[
        {"panel": -1, "speaker": "Ghost", "line": "Before the first panel."},
        {"panel": 1, "speaker": "Captain", "line": "Hold steady."}
    ]"#;
    let driver = MockDriver::new(MockResponse::Text(script.to_string()));
    let writer = ScriptWriter::new(test_utils::service(&driver)?);
    let frames = vec![frame("A signal arrives.", Some(b"one"))];

    let script = writer.write_script(&frames, None).await?;

    assert_eq!(script, vec![ScriptEntry::new(1, "Captain", "Hold steady.")]);
    assert_eq!(driver.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_script_needs_a_finished_panel() -> anyhow::Result<()> {
    let driver = MockDriver::new(MockResponse::Text("[]".to_string()));
    let writer = ScriptWriter::new(test_utils::service(&driver)?);
    let frames = vec![frame("Everything fails.", None), StoryFrame::new("Never sent.", "p")];
    assert_eq!(*frames[1].status(), FrameStatus::Pending);

    let err = writer.write_script(&frames, None).await.unwrap_err();

    assert_eq!(narrative_kind(&err), Some(&NarrativeErrorKind::NoFinishedPanels));
    assert_eq!(driver.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_script_is_retried_then_exhausted() -> anyhow::Result<()> {
    let driver = MockDriver::new(MockResponse::Text("Once upon a time...".to_string()));
    let writer = ScriptWriter::new(test_utils::service(&driver)?);

    let err = writer
        .write_script(&[frame("Alone.", Some(PNG))], None)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::PermanentExhaustion);
    assert_eq!(driver.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_narration_skips_failed_lines_and_keeps_order() -> anyhow::Result<()> {
    let driver = MockDriver::images();
    let speech = MockSpeech::failing_on("static");
    let narrator = Narrator::new(
        test_utils::speaking_service(&driver, &speech)?,
        Arc::new(MockDecoder),
    );
    let script = vec![
        ScriptEntry::new(1, "Narrator", "Dawn."),
        ScriptEntry::new(2, "Robot", "Only static."),
        ScriptEntry::new(3, "Captain Vega", "Engage!"),
    ];

    let clips = narrator.narrate(&script, None).await?;

    let panels: Vec<usize> = clips.iter().map(|c| *c.panel_index()).collect();
    assert_eq!(panels, vec![1, 3]);
    assert_eq!(clips[0].samples().len(), "Dawn.".len() * SAMPLES_PER_BYTE);
    assert!((clips[1].duration_seconds() - 0.07).abs() < 1e-9);

    let mut voices = speech.voices();
    voices.sort();
    let mut expected = vec![
        "JBFqnCBsd6RMkjVDRZzb".to_string(),
        "onwK4e9ZLuTAKqWW03F9".to_string(),
        "pNInz6obpgDQGcFmaJgB".to_string(),
    ];
    expected.sort();
    assert_eq!(voices, expected);
    Ok(())
}

#[tokio::test]
async fn test_narration_uses_custom_voices() -> anyhow::Result<()> {
    let driver = MockDriver::images();
    let speech = MockSpeech::new();
    let narrator = Narrator::new(
        test_utils::speaking_service(&driver, &speech)?,
        Arc::new(MockDecoder),
    )
    .with_voices(VoiceTable::new("fallback").with_voice("Ghost", "spooky"));

    narrator
        .narrate(
            &[
                ScriptEntry::new(1, "The GHOST of Elm Street", "Boo."),
                ScriptEntry::new(1, "Narrator", "Nobody screamed."),
            ],
            None,
        )
        .await?;

    let mut voices = speech.voices();
    voices.sort();
    assert_eq!(voices, vec!["fallback".to_string(), "spooky".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_narration_requires_speech() -> anyhow::Result<()> {
    let driver = MockDriver::images();
    let narrator = Narrator::new(test_utils::service(&driver)?, Arc::new(MockDecoder));

    let clips = narrator
        .narrate(&[ScriptEntry::new(1, "Narrator", "Silence.")], None)
        .await?;

    // Each line fails with a configuration error and is skipped.
    assert!(clips.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_narration_reports_cancellation() -> anyhow::Result<()> {
    let driver = MockDriver::images();
    let speech = MockSpeech::new();
    let narrator = Narrator::new(
        test_utils::speaking_service(&driver, &speech)?,
        Arc::new(MockDecoder),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = narrator
        .narrate(&[ScriptEntry::new(1, "Narrator", "Too late.")], Some(&cancel))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    Ok(())
}

#[test]
fn test_presets_resolve_case_insensitively() -> anyhow::Result<()> {
    assert_eq!(presets().len(), 4);
    let noir = preset("NOIR")?;
    assert_eq!(noir.key, "noir");
    assert_eq!(noir.narrative().lines().count(), 3);

    let err = preset("western").unwrap_err();
    assert_eq!(
        narrative_kind(&err),
        Some(&NarrativeErrorKind::PresetNotFound("western".to_string()))
    );
    Ok(())
}
