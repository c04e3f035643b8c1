//! Comic store port
//!
//! Keyed artifact storage for assembled comics. Implementations must make
//! saves atomic per id: a reader never observes a partially written record.

use async_trait::async_trait;
use math_comic_domain::{ComicMetadata, ComicStatistics, ExportFormat, MultiPanelComic};
use thiserror::Error;

/// Errors from the comic store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Comic not found: {0}")]
    NotFound(String),

    #[error("Invalid comic id: {0}")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ComicStore: Send + Sync {
    /// Save (or overwrite) a comic keyed by its id
    async fn save_comic(&self, comic: &MultiPanelComic) -> Result<String, StoreError>;

    /// Load a comic; `Ok(None)` if the id is unknown
    async fn load_comic(&self, id: &str) -> Result<Option<MultiPanelComic>, StoreError>;

    /// Metadata of every stored comic, newest first
    async fn list_comics(&self) -> Result<Vec<ComicMetadata>, StoreError>;

    /// Delete a comic; `false` if the id is unknown
    async fn delete_comic(&self, id: &str) -> Result<bool, StoreError>;

    /// Export a stored comic; [`StoreError::NotFound`] if the id is unknown
    async fn export_comic(&self, id: &str, format: ExportFormat) -> Result<Vec<u8>, StoreError>;

    /// Aggregate statistics computed from the metadata index only
    async fn get_statistics(&self) -> Result<ComicStatistics, StoreError>;
}
