//! Image asset storage port
//!
//! Persists rendered panel images under deterministic file names and
//! resolves them to a public URL and a local path.

use super::image_generator::ImageArtifact;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the image asset store
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Invalid image file name: {0}")]
    InvalidName(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ImageAssetStore: Send + Sync {
    /// Persist an artifact under `file_name`, returning the stored size in bytes
    async fn store(&self, file_name: &str, artifact: ImageArtifact) -> Result<u64, AssetError>;

    /// Public URL of a stored image
    fn url(&self, file_name: &str) -> String;

    /// Local path of a stored image
    fn path(&self, file_name: &str) -> PathBuf;

    /// Size in bytes, or `None` if the image does not exist
    async fn size(&self, file_name: &str) -> Result<Option<u64>, AssetError>;

    async fn read(&self, file_name: &str) -> Result<Vec<u8>, AssetError>;

    /// Mark an existing image as just used; `false` if it does not exist
    async fn touch(&self, file_name: &str) -> Result<bool, AssetError>;

    /// Remove an image; `false` if it did not exist
    async fn remove(&self, file_name: &str) -> Result<bool, AssetError>;
}
