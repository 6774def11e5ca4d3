//! Tests for the resilient task executor.

mod test_utils;

use forge_core::{FrameId, GenerationTask, ImageData, Input, MediaSource, Modality};
use forge_error::{ErrorCategory, ExecutorErrorKind, ForgeError, ForgeErrorKind, GatewayErrorKind};
use forge_executor::{
    AdmissionGate, CancellationToken, ExecutorConfig, GenerationService, TaskExecutor,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_utils::{MockDriver, MockResponse, MockSpeech};
use tokio::time::Instant;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

fn service(driver: &MockDriver, config: ExecutorConfig) -> anyhow::Result<GenerationService> {
    let executor = TaskExecutor::new(config)?;
    Ok(GenerationService::new(Arc::new(driver.clone()), executor))
}

fn task(prompt: &str, config: &ExecutorConfig) -> GenerationTask {
    GenerationTask::new(FrameId::new(), prompt, None, config.timeout())
}

fn executor_kind(err: &ForgeError) -> Option<&ExecutorErrorKind> {
    match err.kind() {
        ForgeErrorKind::Executor(e) => Some(&e.kind),
        _ => None,
    }
}

#[tokio::test]
async fn test_success_makes_one_call() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Image(PNG.to_vec()));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;

    let image = service.generate_image(task("a ghost ship", &config), None).await?;

    assert_eq!(image, ImageData::new("image/png", PNG.to_vec()));
    assert_eq!(driver.call_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rejections_are_retried_with_exponential_backoff() -> anyhow::Result<()> {
    let driver = MockDriver::fail_then(
        2,
        MockResponse::Text("no picture today".into()),
        MockResponse::Image(PNG.to_vec()),
    );
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;

    let start = Instant::now();
    let image = service.generate_image(task("trap", &config), None).await?;
    let elapsed = start.elapsed();

    assert_eq!(image.bytes, PNG);
    assert_eq!(driver.call_count(), 3);
    // 1233ms after attempt 0, 2466ms after attempt 1.
    assert!(elapsed >= Duration::from_millis(3_699), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3_750), "{elapsed:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_after_five_attempts() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Blocked("IMAGE_SAFETY".into()));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;

    let start = Instant::now();
    let err = service
        .generate_image(task("boss", &config), None)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(driver.call_count(), 5);
    assert_eq!(err.category(), ErrorCategory::PermanentExhaustion);
    match executor_kind(&err) {
        Some(ExecutorErrorKind::Exhausted { attempts, last_error }) => {
            assert_eq!(*attempts, 5);
            assert!(last_error.contains("IMAGE_SAFETY"), "{last_error}");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    // No delay after the final attempt: 1233 * (1 + 2 + 4 + 8).
    assert!(elapsed >= Duration::from_millis(18_495), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(18_600), "{elapsed:?}");
    Ok(())
}

#[tokio::test]
async fn test_permanent_error_is_not_retried() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Error(GatewayErrorKind::MissingApiKey(
        "GEMINI_API_KEY".into(),
    )));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;

    let err = service
        .generate_image(task("signal", &config), None)
        .await
        .unwrap_err();

    assert_eq!(driver.call_count(), 1);
    assert_eq!(err.category(), ErrorCategory::UserInputMissing);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_late_response_from_timed_out_attempt_is_discarded() -> anyhow::Result<()> {
    let driver = MockDriver::sequence(vec![
        MockResponse::Delayed(
            Duration::from_secs(5),
            Box::new(MockResponse::Image(b"late".to_vec())),
        ),
        MockResponse::Image(b"fresh".to_vec()),
    ]);
    let config = ExecutorConfig::builder()
        .timeout_ms(1_000)
        .base_delay_ms(100)
        .build();
    let service = service(&driver, config.clone())?;

    let image = service.generate_image(task("log", &config), None).await?;

    assert_eq!(image.bytes, b"fresh");
    assert_eq!(driver.call_count(), 2);

    // Let the abandoned attempt's timer pass; nothing else is applied.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(driver.call_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_hanging_attempts_time_out() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Hang);
    let config = ExecutorConfig::builder()
        .timeout_ms(500)
        .base_delay_ms(10)
        .max_retries(2)
        .build();
    let service = service(&driver, config.clone())?;

    let err = service
        .generate_image(task("escape", &config), None)
        .await
        .unwrap_err();

    assert_eq!(driver.call_count(), 2);
    match executor_kind(&err) {
        Some(ExecutorErrorKind::Exhausted { last_error, .. }) => {
            assert!(last_error.contains("timed out"), "{last_error}");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_stops_retries() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Empty);
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let err = service
        .generate_image(task("ghost", &config), Some(&cancel))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(driver.call_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_call_aborts() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Hang);
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = service
        .generate_image(task("ghost", &config), Some(&cancel))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(driver.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_before_admission_never_calls() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Image(PNG.to_vec()));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service
        .generate_image(task("ghost", &config), Some(&cancel))
        .await
        .unwrap_err();

    assert_eq!(executor_kind(&err), Some(&ExecutorErrorKind::Cancelled));
    assert_eq!(driver.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sibling_tasks_survive_one_cancellation() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Image(PNG.to_vec()))
        .with_latency(Duration::from_millis(200));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (cancelled, kept) = tokio::join!(
        service.generate_image(task("one", &config), Some(&cancel)),
        service.generate_image(task("two", &config), None),
    );

    assert!(cancelled.unwrap_err().is_cancelled());
    assert_eq!(kept?.bytes, PNG);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_never_exceeds_ceiling() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Image(PNG.to_vec()))
        .with_latency(Duration::from_millis(50));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?;

    let tasks: Vec<_> = (0..12)
        .map(|i| service.generate_image(task(&format!("line {i}"), &config), None))
        .collect();
    let results = futures::future::join_all(tasks).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(driver.call_count(), 12);
    assert_eq!(driver.peak_concurrency(), 4);
    assert_eq!(service.executor().gate().in_flight(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_gate_admits_in_arrival_order() -> anyhow::Result<()> {
    let gate = AdmissionGate::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));
    let held = gate.admit().await?;

    let mut handles = Vec::new();
    for i in 0..5 {
        let gate = gate.clone();
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            let _permit = gate.admit().await?;
            if let Ok(mut order) = order.lock() {
                order.push(i);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, ForgeError>(())
        }));
        // Let the waiter enqueue before spawning the next one.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    drop(held);
    for handle in handles {
        handle.await??;
    }

    let order = order.lock().map(|o| o.clone()).unwrap_or_default();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    assert_eq!(gate.in_flight(), 0);
    Ok(())
}

#[tokio::test]
async fn test_closed_gate_refuses_waiters() {
    let gate = AdmissionGate::new(1);
    gate.close();
    assert!(gate.admit().await.is_err());
}

#[tokio::test]
async fn test_image_request_carries_reference_and_modalities() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Image(PNG.to_vec()));
    let config = ExecutorConfig::default();
    let service = service(&driver, config.clone())?.with_image_model("image-model");
    let reference = Input::Image {
        mime: Some("image/jpeg".into()),
        source: MediaSource::Binary(vec![0xFF, 0xD8]),
    };
    let task = GenerationTask::new(
        FrameId::new(),
        "Boards the vessel",
        Some(reference.clone()),
        config.timeout(),
    );

    service.generate_image(task, None).await?;

    let requests = driver.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model.as_deref(), Some("image-model"));
    assert_eq!(request.response_modalities, vec![Modality::Text, Modality::Image]);
    assert_eq!(request.contents[0], reference);
    assert_eq!(request.contents[1], Input::Text("Boards the vessel".into()));
    Ok(())
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Row {
    panel: usize,
}

#[tokio::test(start_paused = true)]
async fn test_malformed_structure_consumes_retry_budget() -> anyhow::Result<()> {
    let driver = MockDriver::fail_then(
        1,
        MockResponse::Text("Sure! Here is the script:".into()),
        MockResponse::Text("```json\n[{\"panel\": 2}]\n```".into()),
    );
    let config = ExecutorConfig::default();
    let service = service(&driver, config)?;

    let rows: Vec<Row> = service
        .generate_structured(
            vec![Input::Text("write".into())],
            serde_json::json!({"type": "ARRAY"}),
            None,
        )
        .await?;

    assert_eq!(rows, vec![Row { panel: 2 }]);
    assert_eq!(driver.call_count(), 2);
    assert!(driver.requests()[0].response_schema.is_some());
    Ok(())
}

#[tokio::test]
async fn test_text_is_trimmed() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Text("  hello \n".into()));
    let service = service(&driver, ExecutorConfig::default())?;
    let text = service.generate_text(vec![Input::Text("hi".into())], None).await?;
    assert_eq!(text, "hello");
    Ok(())
}

#[tokio::test]
async fn test_speech_requires_synthesizer() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Empty);
    let service = service(&driver, ExecutorConfig::default())?;
    assert!(!service.has_speech());
    assert!(service.synthesize_speech("voice", "hello", None).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_speech_chunks_are_concatenated() -> anyhow::Result<()> {
    let driver = MockDriver::always(MockResponse::Empty);
    let speech = Arc::new(MockSpeech::new(vec![b"ab", b"cd", b"ef"]));
    let service = service(&driver, ExecutorConfig::default())?.with_speech(speech.clone());

    let audio = service.synthesize_speech("voice", "hello", None).await?;

    assert_eq!(audio, b"abcdef");
    assert_eq!(speech.call_count(), 1);
    Ok(())
}

#[test]
fn test_config_validation() {
    assert!(ExecutorConfig::default().validate().is_ok());
    assert!(ExecutorConfig::builder().max_concurrent(0).build().validate().is_err());
    assert!(ExecutorConfig::builder().max_retries(0).build().validate().is_err());
    assert!(ExecutorConfig::builder().timeout_ms(0).build().validate().is_err());
    assert!(TaskExecutor::new(ExecutorConfig::builder().max_concurrent(0).build()).is_err());
}

#[test]
fn test_backoff_doubles_per_attempt() {
    let config = ExecutorConfig::builder().base_delay_ms(1_200).build();
    let delays: Vec<u64> = (0..5)
        .map(|i| config.backoff_delay(i).as_millis() as u64)
        .collect();
    assert_eq!(delays, vec![1_200, 2_400, 4_800, 9_600, 19_200]);
}
