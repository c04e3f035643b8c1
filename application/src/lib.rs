//! Application layer for math-comic
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod resources;
pub mod use_cases;

// Re-export commonly used types
pub use config::PipelineParams;
pub use ports::{
    comic_store::{ComicStore, StoreError},
    content_gateway::ContentGateway,
    image_asset_store::{AssetError, ImageAssetStore},
    image_generator::{ImageArtifact, ImageGenerator, ImageRequest},
    pipeline_logger::{EventFields, NoPipelineLogger, PipelineEvent, PipelineLogger},
    progress::{NoProgress, PipelineProgress},
};
pub use resources::{AdmissionError, AdmissionPolicy, PipelineContext, ResourceManager};
pub use use_cases::build_prompt::{BuildPromptError, BuildPromptUseCase};
pub use use_cases::generate_comic::{GenerateComicError, GenerateComicInput, GenerateComicUseCase};
pub use use_cases::generate_content::{ContentGenerationError, GenerateContentUseCase};
pub use use_cases::render_images::{RenderError, RenderImagesUseCase, panel_file_name};
