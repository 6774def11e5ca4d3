//! Shared entry point for every remote call the pipeline makes.

use crate::TaskExecutor;
use forge_core::{GenerateRequest, GenerationTask, ImageData, Input, Modality};
use forge_error::{ConfigError, ForgeResult, GatewayError, GatewayErrorKind};
use forge_interface::{ForgeDriver, SpeechSynthesis, collect_audio, first_image, response_text};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Routes image, text and speech calls through one executor.
///
/// Because all three paths share the executor, they share its concurrency
/// ceiling and retry policy.
#[derive(Clone)]
pub struct GenerationService {
    driver: Arc<dyn ForgeDriver>,
    speech: Option<Arc<dyn SpeechSynthesis>>,
    executor: TaskExecutor,
    image_model: String,
    text_model: String,
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("provider", &self.driver.provider_name())
            .field("speech", &self.speech.as_ref().map(|s| s.provider_name()))
            .field("executor", &self.executor)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish()
    }
}

impl GenerationService {
    /// Create a service; both model names default to the driver's model.
    pub fn new(driver: Arc<dyn ForgeDriver>, executor: TaskExecutor) -> Self {
        let model = driver.model_name().to_string();
        Self {
            driver,
            speech: None,
            executor,
            image_model: model.clone(),
            text_model: model,
        }
    }

    /// Attach a speech synthesizer.
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesis>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Model used for panel illustration.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Model used for text and structured generation.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// The executor all calls go through.
    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    /// Whether speech synthesis is available.
    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    /// Illustrate `task.prompt`, conditioned on the task's reference image.
    ///
    /// # Errors
    ///
    /// Any terminal executor outcome; responses without inline image data
    /// are retried within the attempt budget.
    #[instrument(skip_all, fields(task_id = %task.id(), model = %self.image_model))]
    pub async fn generate_image(
        &self,
        task: GenerationTask,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<ImageData> {
        let driver = Arc::clone(&self.driver);
        let model = self.image_model.clone();
        self.executor
            .submit(task, cancel, move |task| {
                let driver = Arc::clone(&driver);
                let request = image_request(&model, task);
                async move {
                    let response = driver.generate(&request).await?;
                    first_image(&response)
                }
            })
            .await
    }

    /// Generate text from `contents`, returning the trimmed body.
    #[instrument(skip_all, fields(parts = contents.len(), model = %self.text_model))]
    pub async fn generate_text(
        &self,
        contents: Vec<Input>,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<String> {
        let request = Arc::new(GenerateRequest {
            contents,
            model: Some(self.text_model.clone()),
            ..Default::default()
        });
        self.run_text("text", request, cancel, Ok).await
    }

    /// Generate JSON constrained by `schema` and parse it as `T`.
    ///
    /// A body that does not parse counts as a rejected response and is
    /// retried like any other rejection.
    #[instrument(skip_all, fields(parts = contents.len(), model = %self.text_model))]
    pub async fn generate_structured<T>(
        &self,
        contents: Vec<Input>,
        schema: serde_json::Value,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<T>
    where
        T: DeserializeOwned,
    {
        let request = Arc::new(GenerateRequest {
            contents,
            model: Some(self.text_model.clone()),
            response_schema: Some(schema),
            ..Default::default()
        });
        self.run_text("structured", request, cancel, |text| {
            serde_json::from_str::<T>(strip_code_fence(&text)).map_err(|e| {
                debug!(error = %e, "Structured response failed to parse");
                GatewayError::new(GatewayErrorKind::MalformedStructure(e.to_string())).into()
            })
        })
        .await
    }

    async fn run_text<T, P>(
        &self,
        label: &str,
        request: Arc<GenerateRequest>,
        cancel: Option<&CancellationToken>,
        parse: P,
    ) -> ForgeResult<T>
    where
        P: Fn(String) -> ForgeResult<T>,
    {
        let deadline = self.executor.config().timeout();
        let parse = &parse;
        self.executor
            .execute(label, deadline, cancel, |_| {
                let driver = Arc::clone(&self.driver);
                let request = Arc::clone(&request);
                async move {
                    let response = driver.generate(&request).await?;
                    parse(response_text(&response)?)
                }
            })
            .await
    }

    /// Synthesize `text` with `voice_id`, returning the concatenated audio.
    ///
    /// # Errors
    ///
    /// A configuration error if no synthesizer is attached, otherwise any
    /// terminal executor outcome.
    #[instrument(skip_all, fields(voice_id = %voice_id, chars = text.len()))]
    pub async fn synthesize_speech(
        &self,
        voice_id: &str,
        text: &str,
        cancel: Option<&CancellationToken>,
    ) -> ForgeResult<Vec<u8>> {
        let Some(speech) = self.speech.clone() else {
            return Err(ConfigError::new("No speech synthesizer configured").into());
        };
        let label = format!("speech:{voice_id}");
        let deadline = self.executor.config().timeout();
        self.executor
            .execute(&label, deadline, cancel, |_| {
                let speech = Arc::clone(&speech);
                let voice_id = voice_id.to_string();
                let text = text.to_string();
                async move {
                    let stream = speech.synthesize(&voice_id, &text).await?;
                    collect_audio(stream).await
                }
            })
            .await
    }
}

fn image_request(model: &str, task: &GenerationTask) -> GenerateRequest {
    let mut contents = Vec::with_capacity(2);
    if let Some(reference) = task.reference() {
        contents.push(reference.clone());
    }
    contents.push(Input::Text(task.prompt().clone()));
    GenerateRequest {
        contents,
        model: Some(model.to_string()),
        response_modalities: vec![Modality::Text, Modality::Image],
        ..Default::default()
    }
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the info string ("json") on the opening line.
    match body.split_once('\n') {
        Some((info, code)) if !info.trim().contains(' ') => code.trim(),
        _ => body.trim(),
    }
}
