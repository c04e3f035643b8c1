//! Image generator port

use async_trait::async_trait;
use math_comic_domain::ApiError;

/// A single panel image request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Full rendering prompt (description plus style cues)
    pub prompt: String,
    /// 1-based panel number, for logging
    pub panel_number: usize,
}

/// What the provider handed back for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageArtifact {
    /// Raw image bytes
    Bytes(Vec<u8>),
    /// A temporary URL the image must be downloaded from
    Url(String),
}

/// Gateway for image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageArtifact, ApiError>;
}
