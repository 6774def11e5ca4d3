//! Error types for Narrative Forge.
//!
//! This crate provides the foundation error types used throughout the forge workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! [`ForgeError::category`] maps any error onto the failure taxonomy the
//! executor and exporters reason about (transient, timeout, rejection,
//! cancelled, exhausted, encoding, missing input).
//!
//! # Examples
//!
//! ```
//! use forge_error::{ErrorCategory, ForgeResult, GatewayError, GatewayErrorKind};
//!
//! fn render() -> ForgeResult<Vec<u8>> {
//!     Err(GatewayError::new(GatewayErrorKind::NoImageData))?
//! }
//!
//! let err = render().unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::ApplicationRejection);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod gateway;
mod http;
mod media;
mod narrative;

pub use config::ConfigError;
pub use error::{ErrorCategory, ForgeError, ForgeErrorKind, ForgeResult};
pub use executor::{ExecutorError, ExecutorErrorKind};
pub use gateway::{GatewayError, GatewayErrorKind, RetryableError};
pub use http::HttpError;
pub use media::{MediaError, MediaErrorKind};
pub use narrative::{NarrativeError, NarrativeErrorKind};
