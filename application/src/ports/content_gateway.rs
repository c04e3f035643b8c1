//! Content gateway port
//!
//! Defines the interface for the text-generation provider that writes comic
//! scripts (and, optionally, optimizes prompts).

use async_trait::async_trait;
use math_comic_domain::ApiError;

/// Gateway for text completion
///
/// Implementations (adapters) live in the infrastructure layer and are
/// responsible for mapping transport and provider failures into [`ApiError`]
/// with a normalized code.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Send a system/user prompt pair and return the raw completion text
    async fn complete(&self, system: &str, user: &str) -> Result<String, ApiError>;
}
