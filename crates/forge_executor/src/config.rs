//! Executor tuning parameters.

use forge_error::{ConfigError, ForgeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Concurrency, timeout and retry settings shared by every submitted task.
///
/// # Examples
///
/// ```
/// use forge_executor::ExecutorConfig;
///
/// let config = ExecutorConfig::default();
/// assert_eq!(*config.max_concurrent(), 4);
/// assert_eq!(*config.max_retries(), 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Ceiling on simultaneously running tasks.
    #[serde(default = "default_max_concurrent")]
    max_concurrent: usize,

    /// Attempts allowed per task, including the first.
    #[serde(default = "default_max_retries")]
    max_retries: u32,

    /// Deadline for a single attempt, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,

    /// Backoff base; the delay after failed attempt `i` is `base * 2^i`.
    #[serde(default = "default_base_delay_ms")]
    base_delay_ms: u64,

    /// Optional pacing of attempts across all tasks.
    #[serde(default)]
    requests_per_minute: Option<u32>,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_retries() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    123_333
}

fn default_base_delay_ms() -> u64 {
    1_233
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            requests_per_minute: None,
        }
    }
}

impl ExecutorConfig {
    /// Creates a new executor config builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay slept after zero-based attempt `attempt` fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_executor::ExecutorConfig;
    /// use std::time::Duration;
    ///
    /// let config = ExecutorConfig::default();
    /// assert_eq!(config.backoff_delay(0), Duration::from_millis(1_233));
    /// assert_eq!(config.backoff_delay(3), Duration::from_millis(9_864));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Validates that the executor can make progress.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if concurrency, attempts or timeout is zero.
    pub fn validate(&self) -> ForgeResult<()> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::new("executor.max_concurrent must be at least 1").into());
        }
        if self.max_retries == 0 {
            return Err(ConfigError::new("executor.max_retries must be at least 1").into());
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::new("executor.timeout_ms must be greater than 0").into());
        }
        if self.requests_per_minute == Some(0) {
            return Err(
                ConfigError::new("executor.requests_per_minute must be omitted or positive").into(),
            );
        }
        Ok(())
    }
}

/// Builder for `ExecutorConfig`.
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    max_concurrent: Option<usize>,
    max_retries: Option<u32>,
    timeout_ms: Option<u64>,
    base_delay_ms: Option<u64>,
    requests_per_minute: Option<u32>,
}

impl ExecutorConfigBuilder {
    /// Sets the concurrency ceiling.
    pub fn max_concurrent(mut self, value: usize) -> Self {
        self.max_concurrent = Some(value);
        self
    }

    /// Sets the attempt budget.
    pub fn max_retries(mut self, value: u32) -> Self {
        self.max_retries = Some(value);
        self
    }

    /// Sets the per-attempt deadline in milliseconds.
    pub fn timeout_ms(mut self, value: u64) -> Self {
        self.timeout_ms = Some(value);
        self
    }

    /// Sets the backoff base in milliseconds.
    pub fn base_delay_ms(mut self, value: u64) -> Self {
        self.base_delay_ms = Some(value);
        self
    }

    /// Enables request pacing.
    pub fn requests_per_minute(mut self, value: u32) -> Self {
        self.requests_per_minute = Some(value);
        self
    }

    /// Builds the config, filling unset fields with defaults.
    pub fn build(self) -> ExecutorConfig {
        let defaults = ExecutorConfig::default();
        ExecutorConfig {
            max_concurrent: self.max_concurrent.unwrap_or(defaults.max_concurrent),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            base_delay_ms: self.base_delay_ms.unwrap_or(defaults.base_delay_ms),
            requests_per_minute: self.requests_per_minute,
        }
    }
}
