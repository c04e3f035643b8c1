//! Infrastructure layer for math-comic
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConceptConfig, FileConfig, FileDefaultsConfig,
    FileImageConfig, FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileStorageConfig,
};
pub use logging::JsonlPipelineLogger;
pub use providers::openai::{OpenAiContentGateway, OpenAiEndpoint, OpenAiImageGateway};
pub use storage::{FileComicStore, LocalImageAssetStore};
