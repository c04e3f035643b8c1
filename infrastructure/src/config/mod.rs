//! Configuration file loading for math-comic
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MATH_COMIC_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./math-comic.toml` or `./.math-comic.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/math-comic/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConceptConfig, FileConfig, FileDefaultsConfig, FileImageConfig,
    FileLexiconTerm, FileLoggingConfig, FileOutputConfig, FilePromptConfig, FileProviderConfig,
    FileResourcesConfig, FileRetryConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
