//! Raw configuration as read from TOML, environment and defaults
//!
//! Every section is `#[serde(default)]`, so a config file only needs the keys
//! it overrides. [`FileConfig::validate`] rejects values the pipeline cannot
//! run with; conversion methods turn sections into domain/application types.

mod concept;
mod defaults;
mod logging;
mod output;
mod pipeline;
mod provider;
mod storage;

pub use concept::{FileConceptConfig, FileLexiconTerm};
pub use defaults::FileDefaultsConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use pipeline::{FilePromptConfig, FileResourcesConfig, FileRetryConfig};
pub use provider::{FileImageConfig, FileProviderConfig};
pub use storage::FileStorageConfig;

use math_comic_application::{PipelineParams, ResourceManager};
use math_comic_domain::{
    ConceptValidator, MAX_PANELS, MIN_PANELS, OptionsProcessor, RetryPolicy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("[{0}] timeout_seconds cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("[{0}] model cannot be empty")]
    EmptyModelName(&'static str),

    #[error("[retry] max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("[retry] multiplier must be >= 1.0 (got {0})")]
    InvalidMultiplier(f64),

    #[error("[retry] initial_delay_ms cannot exceed max_delay_ms")]
    InvalidDelayRange,

    #[error("[resources] {0} must be at least 1")]
    ZeroConcurrency(&'static str),

    #[error("[concept] threshold must be positive (got {0})")]
    InvalidThreshold(f32),

    #[error("[defaults] panel_count must be between {MIN_PANELS} and {MAX_PANELS} (got {0})")]
    PanelCountOutOfRange(u8),

    #[error("[logging] queue_capacity must be at least 1")]
    ZeroQueueCapacity,
}

/// Complete configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: FileProviderConfig,
    pub image: FileImageConfig,
    pub storage: FileStorageConfig,
    pub retry: FileRetryConfig,
    pub resources: FileResourcesConfig,
    pub prompt: FilePromptConfig,
    pub concept: FileConceptConfig,
    pub defaults: FileDefaultsConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("provider"));
        }
        if self.image.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("image"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("provider"));
        }
        if self.image.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("image"));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigValidationError::ZeroAttempts);
        }
        if !(self.retry.multiplier >= 1.0) {
            return Err(ConfigValidationError::InvalidMultiplier(self.retry.multiplier));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigValidationError::InvalidDelayRange);
        }

        if self.resources.max_concurrent_api_calls == 0 {
            return Err(ConfigValidationError::ZeroConcurrency(
                "max_concurrent_api_calls",
            ));
        }
        if self.resources.max_concurrent_pipelines == 0 {
            return Err(ConfigValidationError::ZeroConcurrency(
                "max_concurrent_pipelines",
            ));
        }

        if !(self.concept.threshold > 0.0) {
            return Err(ConfigValidationError::InvalidThreshold(
                self.concept.threshold,
            ));
        }

        let panels = self.defaults.panel_count;
        if !(MIN_PANELS..=MAX_PANELS).contains(&panels) {
            return Err(ConfigValidationError::PanelCountOutOfRange(panels));
        }

        if self.logging.queue_capacity == 0 {
            return Err(ConfigValidationError::ZeroQueueCapacity);
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_retry_policy()
    }

    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams::default()
            .with_retry(self.retry_policy())
            .with_optimize_prompt(self.prompt.optimize)
            .with_save_retries(self.storage.save_retries)
    }

    pub fn resource_manager(&self) -> ResourceManager {
        self.resources.to_resource_manager()
    }

    pub fn concept_validator(&self) -> ConceptValidator {
        self.concept.to_validator()
    }

    pub fn options_processor(&self) -> OptionsProcessor {
        self.defaults.to_options_processor()
    }
}
