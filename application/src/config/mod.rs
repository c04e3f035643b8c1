//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`PipelineParams`] — retry policy, prompt optimization and save retries

pub mod pipeline_params;

pub use pipeline_params::PipelineParams;
