//! Pipeline parameters — use case behavior control.
//!
//! [`PipelineParams`] groups the static parameters that control
//! [`GenerateComicUseCase`](crate::use_cases::generate_comic::GenerateComicUseCase)
//! and its stages. These are application-layer concerns, not domain policy.

use math_comic_domain::RetryPolicy;

/// Pipeline control parameters.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Retry policy for content generation calls.
    pub retry: RetryPolicy,
    /// Rewrite the user prompt through a second gateway call before generation.
    pub optimize_prompt: bool,
    /// Automatic retries of a failed save before surfacing a storage error.
    pub save_retries: u32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            optimize_prompt: false,
            save_retries: 1,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_optimize_prompt(mut self, optimize: bool) -> Self {
        self.optimize_prompt = optimize;
        self
    }

    pub fn with_save_retries(mut self, retries: u32) -> Self {
        self.save_retries = retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default() {
        let params = PipelineParams::default();
        assert_eq!(params.retry.max_attempts, 3);
        assert!(!params.optimize_prompt);
        assert_eq!(params.save_retries, 1);
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_retry(RetryPolicy {
                max_attempts: 5,
                initial_delay: Duration::from_millis(10),
                ..Default::default()
            })
            .with_optimize_prompt(true)
            .with_save_retries(0);

        assert_eq!(params.retry.max_attempts, 5);
        assert!(params.optimize_prompt);
        assert_eq!(params.save_retries, 0);
    }
}
