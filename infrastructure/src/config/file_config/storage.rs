//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Root for comics, the index and images (default: platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Prefix for public image URLs
    pub public_base_url: String,
    /// Extra save attempts after a failed write
    pub save_retries: u32,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            public_base_url: "/images".to_string(),
            save_retries: 1,
        }
    }
}

impl FileStorageConfig {
    /// Configured data dir, else `$XDG_DATA_HOME/math-comic`, else `./math-comic-data`
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("math-comic")))
            .unwrap_or_else(|| PathBuf::from("math-comic-data"))
    }
}
