//! Resilient task execution for Narrative Forge.
//!
//! - [`AdmissionGate`]: FIFO counting gate bounding in-flight work
//! - [`TaskExecutor`]: per-attempt deadline, exponential backoff, cancellation
//! - [`GenerationService`]: image, text, structured and speech calls sharing
//!   one executor
//! - [`ExecutorConfig`]: tuning, loaded from the `[executor]` config section

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod executor;
mod gate;
mod service;

pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use executor::TaskExecutor;
pub use gate::{AdmissionGate, AdmissionPermit};
pub use service::GenerationService;
pub use tokio_util::sync::CancellationToken;
