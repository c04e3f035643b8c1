//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod comic_store;
pub mod content_gateway;
pub mod image_asset_store;
pub mod image_generator;
pub mod pipeline_logger;
pub mod progress;
