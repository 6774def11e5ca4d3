//! Application configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`forge.toml` shipped with the crate)
//! 2. `~/.config/forge/forge.toml`
//! 3. `./forge.toml`
//!
//! The two user files are optional.

use config::{Config, File, FileFormat};
use forge_error::{ConfigError, ForgeError, ForgeResult};
use forge_executor::ExecutorConfig;
use forge_media::ExportConfig;
use forge_models::{ModelsConfig, SpeechConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../forge.toml");

/// All configuration sections.
///
/// # Examples
///
/// ```
/// use forge::ForgeConfig;
///
/// let config = ForgeConfig::bundled()?;
/// assert_eq!(*config.executor().max_concurrent(), 4);
/// assert_eq!(config.models().text(), "gemini-2.5-flash");
/// # Ok::<(), forge::ForgeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct ForgeConfig {
    /// Executor tuning
    #[serde(default)]
    executor: ExecutorConfig,
    /// Gemini endpoint and models
    #[serde(default)]
    models: ModelsConfig,
    /// Speech endpoint
    #[serde(default)]
    speech: SpeechConfig,
    /// Export settings
    #[serde(default)]
    export: ExportConfig,
}

impl ForgeConfig {
    /// Load with the bundled < home < current-directory precedence.
    #[instrument]
    pub fn load() -> ForgeResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/forge/forge.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("forge").required(false));

        let config = builder
            .build()
            .map_err(|e| config_error(format!("Failed to build configuration: {}", e)))?;
        Self::finish(config)
    }

    /// Bundled defaults only.
    pub fn bundled() -> ForgeResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .map_err(|e| config_error(format!("Failed to read bundled configuration: {}", e)))?;
        Self::finish(config)
    }

    /// Load a single explicit file; sections it omits take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ForgeResult<Self> {
        debug!("Loading configuration from file");

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                config_error(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        Self::finish(config)
    }

    /// Check every section's invariants.
    pub fn validate(&self) -> ForgeResult<()> {
        self.executor.validate()?;
        self.export.validate()
    }

    fn finish(config: Config) -> ForgeResult<Self> {
        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| config_error(format!("Failed to parse configuration: {}", e)))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

fn config_error(message: String) -> ForgeError {
    ForgeError::from(ConfigError::new(message))
}
