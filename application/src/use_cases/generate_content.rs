//! Generate Content use case
//!
//! Sends the prompt to the content gateway, parses the comic script, and
//! retries transient failures under the configured [`RetryPolicy`].

use crate::ports::content_gateway::ContentGateway;
use crate::ports::pipeline_logger::{EventFields, PipelineEvent};
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::resources::PipelineContext;
use crate::use_cases::shared::{cancellable, elapsed_ms, sleep_cancellable};
use math_comic_domain::{
    ApiError, ComicContent, ErrorResponse, PromptGenerationResponse, RetryPolicy, Stage,
    parse_comic_content,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentGenerationError {
    /// Retryable failure that outlived the attempt budget
    #[error("{response} (gave up after {attempts} attempts)")]
    Transient {
        response: ErrorResponse,
        attempts: u32,
    },

    #[error("{response}")]
    Permanent {
        response: ErrorResponse,
        attempts: u32,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

pub struct GenerateContentUseCase<G: ContentGateway + 'static> {
    gateway: Arc<G>,
    policy: RetryPolicy,
}

impl<G: ContentGateway + 'static> GenerateContentUseCase<G> {
    pub fn new(gateway: Arc<G>, policy: RetryPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Classify a provider error after the given attempt
    pub fn handle_api_error(&self, error: &ApiError, attempt: u32) -> ErrorResponse {
        ErrorResponse::from_api_error(error, attempt, &self.policy)
    }

    pub async fn generate_comic_content(
        &self,
        prompt: &PromptGenerationResponse,
        ctx: &PipelineContext,
    ) -> Result<ComicContent, ContentGenerationError> {
        self.generate_with_progress(prompt, ctx, &NoProgress).await
    }

    pub async fn generate_with_progress(
        &self,
        prompt: &PromptGenerationResponse,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<ComicContent, ContentGenerationError> {
        let expected = prompt.panel_count as usize;
        let mut attempt = 0;

        loop {
            attempt += 1;
            if ctx.is_cancelled() {
                return Err(ContentGenerationError::Cancelled);
            }

            let error = match self.attempt_once(prompt, expected, attempt, ctx).await? {
                Ok(content) => {
                    info!(
                        attempt,
                        title = %content.title,
                        "Comic script generated"
                    );
                    return Ok(content);
                }
                Err(error) => error,
            };

            let response = self.handle_api_error(&error, attempt);
            warn!(
                attempt,
                code = %error.code,
                retry = response.should_retry,
                "Content generation failed: {}",
                error.message
            );

            let mut fields = EventFields::new(&ctx.request_id)
                .stage(Stage::ContentGeneration)
                .attempt(attempt)
                .success(false)
                .error_code(error.code.as_str())
                .message(error.message.clone())
                .extra("should_retry", response.should_retry);
            if let Some(delay) = response.retry_after {
                fields = fields.extra("retry_after_ms", delay.as_millis() as u64);
            }
            ctx.logger.log(PipelineEvent::new("api_error", fields));

            if !response.should_retry {
                return Err(ContentGenerationError::Permanent {
                    response,
                    attempts: attempt,
                });
            }
            if !self.policy.allows_another(attempt) {
                return Err(ContentGenerationError::Transient {
                    response,
                    attempts: attempt,
                });
            }

            let delay = response
                .retry_after
                .unwrap_or_else(|| self.policy.backoff(attempt));
            progress.on_retry(attempt, delay, &response);
            if !sleep_cancellable(&ctx.cancellation, delay).await {
                return Err(ContentGenerationError::Cancelled);
            }
        }
    }

    /// One gateway call plus parsing. The outer `Result` only carries
    /// cancellation; provider and parse failures come back as `ApiError`.
    async fn attempt_once(
        &self,
        prompt: &PromptGenerationResponse,
        expected: usize,
        attempt: u32,
        ctx: &PipelineContext,
    ) -> Result<Result<ComicContent, ApiError>, ContentGenerationError> {
        let _permit = ctx
            .resources
            .acquire_api_permit(&ctx.cancellation)
            .await
            .map_err(|_| ContentGenerationError::Cancelled)?;

        ctx.logger.log(PipelineEvent::new(
            "api_request",
            EventFields::new(&ctx.request_id)
                .stage(Stage::ContentGeneration)
                .attempt(attempt)
                .extra("prompt_chars", prompt.char_len()),
        ));

        let started = Instant::now();
        let result = cancellable(
            &ctx.cancellation,
            self.gateway
                .complete(&prompt.system_prompt, &prompt.user_prompt),
        )
        .await
        .ok_or(ContentGenerationError::Cancelled)?;

        let parsed = result.and_then(|text| {
            parse_comic_content(&text, expected)
                .map_err(|e| ApiError::invalid_response(e.to_string()))
        });

        if parsed.is_ok() {
            ctx.logger.log(PipelineEvent::new(
                "api_response",
                EventFields::new(&ctx.request_id)
                    .stage(Stage::ContentGeneration)
                    .attempt(attempt)
                    .duration_ms(elapsed_ms(started))
                    .success(true),
            ));
        }
        Ok(parsed)
    }
}
