//! Resilient task executor: admission, per-attempt deadline, backoff, cancellation.

use crate::{AdmissionGate, ExecutorConfig};
use forge_core::GenerationTask;
use forge_error::{ExecutorError, ExecutorErrorKind, ForgeError, ForgeResult, RetryableError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Runs fallible remote operations under a shared concurrency ceiling.
///
/// Each submitted task holds one admission slot for its whole lifetime,
/// attempts included. Attempts of one task are strictly sequential; different
/// tasks retry independently. Cloning the executor shares its gate.
///
/// # Examples
///
/// ```
/// use forge_executor::{ExecutorConfig, TaskExecutor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = TaskExecutor::new(ExecutorConfig::default())?;
/// let answer = executor
///     .execute("answer", executor.config().timeout(), None, |_attempt| async {
///         Ok::<_, forge_error::ForgeError>(42)
///     })
///     .await?;
/// assert_eq!(answer, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TaskExecutor {
    config: Arc<ExecutorConfig>,
    gate: AdmissionGate,
    pacer: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("paced", &self.pacer.is_some())
            .finish()
    }
}

impl TaskExecutor {
    /// Create an executor from validated settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(config: ExecutorConfig) -> ForgeResult<Self> {
        config.validate()?;
        let pacer = (*config.requests_per_minute())
            .and_then(NonZeroU32::new)
            .map(|rpm| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(rpm))));
        Ok(Self {
            gate: AdmissionGate::new(*config.max_concurrent()),
            config: Arc::new(config),
            pacer,
        })
    }

    /// Settings this executor runs with.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The shared admission gate.
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Run a generation task to settlement.
    ///
    /// `operation` is invoked once per attempt with the task, whose attempt
    /// counter has already been advanced. The task's deadline bounds each
    /// attempt.
    #[instrument(skip_all, fields(task_id = %task.id()))]
    pub async fn submit<T, F, Fut>(
        &self,
        mut task: GenerationTask,
        cancel: Option<&CancellationToken>,
        operation: F,
    ) -> ForgeResult<T>
    where
        F: Fn(&GenerationTask) -> Fut,
        Fut: Future<Output = ForgeResult<T>>,
    {
        let label = task.id().to_string();
        let deadline = *task.deadline();
        self.execute(&label, deadline, cancel, |_| {
            task.begin_attempt();
            operation(&task)
        })
        .await
    }

    /// Run `operation` with admission, deadline, retry and cancellation.
    ///
    /// `operation` receives the zero-based attempt index. Dropping an
    /// attempt's future on timeout or cancellation discards any response it
    /// would have produced.
    ///
    /// # Errors
    ///
    /// - `Cancelled` once `cancel` fires, whether waiting for a slot, in flight
    ///   or sleeping between attempts
    /// - the operation's own error if it is not retryable
    /// - `Exhausted` once every allowed attempt failed
    pub async fn execute<T, F, Fut>(
        &self,
        label: &str,
        deadline: Duration,
        cancel: Option<&CancellationToken>,
        mut operation: F,
    ) -> ForgeResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ForgeResult<T>>,
    {
        let cancel = cancel.cloned().unwrap_or_default();
        let max_attempts = *self.config.max_retries();

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(label)),
            permit = self.gate.admit() => permit?,
        };
        debug!(label, in_flight = self.gate.in_flight(), "Task admitted");

        let mut last_error: Option<ForgeError> = None;
        for attempt in 0..max_attempts {
            if cancel.is_cancelled() {
                return Err(cancelled(label));
            }

            if let Some(pacer) = &self.pacer {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(label)),
                    _ = pacer.until_ready() => {}
                }
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(label)),
                outcome = tokio::time::timeout(deadline, operation(attempt)) => outcome,
            };

            let err = match outcome {
                Ok(Ok(value)) => {
                    debug!(label, attempt, "Attempt succeeded");
                    return Ok(value);
                }
                Ok(Err(err)) => err,
                Err(_elapsed) => ExecutorError::new(ExecutorErrorKind::Timeout {
                    attempt,
                    timeout_ms: deadline.as_millis() as u64,
                })
                .into(),
            };

            if !err.is_retryable() {
                warn!(label, attempt, error = %err, "Permanent error, failing immediately");
                return Err(err);
            }

            if attempt + 1 < max_attempts {
                let delay = self.config.backoff_delay(attempt);
                warn!(
                    label,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(label)),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            last_error = Some(err);
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        error!(label, attempts = max_attempts, last_error = %last_error, "Retries exhausted");
        Err(ExecutorError::new(ExecutorErrorKind::Exhausted {
            attempts: max_attempts,
            last_error,
        })
        .into())
    }
}

#[track_caller]
fn cancelled(label: &str) -> ForgeError {
    debug!(label, "Task cancelled");
    ExecutorError::new(ExecutorErrorKind::Cancelled).into()
}
