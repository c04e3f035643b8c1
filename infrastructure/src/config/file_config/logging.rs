//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file for structured pipeline events; disabled when unset
    pub event_log: Option<PathBuf>,
    /// Events buffered before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            event_log: None,
            queue_capacity: 1024,
        }
    }
}
