//! Build Prompt use case
//!
//! Generates the system/user prompt pair for a concept, validates it, and
//! optionally rewrites the user prompt through the content gateway.

use crate::ports::content_gateway::ContentGateway;
use crate::ports::pipeline_logger::{EventFields, PipelineEvent};
use crate::resources::PipelineContext;
use crate::use_cases::shared::{cancellable, elapsed_ms};
use math_comic_domain::{
    GenerationOptions, MathConcept, PromptGenerationResponse, PromptTemplate, Stage,
    ValidationResult,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildPromptError {
    #[error("Invalid prompt: {message}")]
    Invalid {
        message: String,
        suggestions: Vec<String>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

pub struct BuildPromptUseCase<G: ContentGateway + 'static> {
    gateway: Arc<G>,
    optimize: bool,
}

impl<G: ContentGateway + 'static> BuildPromptUseCase<G> {
    pub fn new(gateway: Arc<G>, optimize: bool) -> Self {
        Self { gateway, optimize }
    }

    /// Generate, validate and (if enabled) optimize a prompt
    pub async fn execute(
        &self,
        concept: &MathConcept,
        options: &GenerationOptions,
        ctx: &PipelineContext,
    ) -> Result<PromptGenerationResponse, BuildPromptError> {
        let prompt = self.generate_prompt(concept, options).await;

        let validation = self.validate_prompt(&prompt);
        if !validation.is_valid() {
            let (_, message, suggestions) = validation.into_parts();
            return Err(BuildPromptError::Invalid {
                message,
                suggestions,
            });
        }

        if self.optimize {
            self.optimize_prompt(prompt, options, ctx).await
        } else {
            Ok(prompt)
        }
    }

    pub async fn generate_prompt(
        &self,
        concept: &MathConcept,
        options: &GenerationOptions,
    ) -> PromptGenerationResponse {
        let prompt = PromptGenerationResponse::build(concept, options);
        debug!(
            topic = concept.topic(),
            panels = options.panel_count,
            chars = prompt.char_len(),
            "Generated prompt"
        );
        prompt
    }

    pub fn validate_prompt(&self, prompt: &PromptGenerationResponse) -> ValidationResult {
        prompt.validate()
    }

    /// Best-effort rewrite of the user prompt.
    ///
    /// Any failure other than cancellation returns the original prompt.
    pub async fn optimize_prompt(
        &self,
        prompt: PromptGenerationResponse,
        options: &GenerationOptions,
        ctx: &PipelineContext,
    ) -> Result<PromptGenerationResponse, BuildPromptError> {
        let started = Instant::now();

        let _permit = ctx
            .resources
            .acquire_api_permit(&ctx.cancellation)
            .await
            .map_err(|_| BuildPromptError::Cancelled)?;

        let result = cancellable(
            &ctx.cancellation,
            self.gateway.complete(
                PromptTemplate::optimizer_system(),
                &PromptTemplate::optimizer_user(&prompt.user_prompt),
            ),
        )
        .await
        .ok_or(BuildPromptError::Cancelled)?;

        let fields = EventFields::new(&ctx.request_id)
            .stage(Stage::PromptBuilding)
            .duration_ms(elapsed_ms(started))
            .extra("operation", "optimize_prompt");

        let rewritten = match result {
            Ok(text) => prompt.with_user_prompt(text.trim()),
            Err(e) => {
                warn!("Prompt optimization failed, keeping original: {}", e);
                ctx.logger.log(PipelineEvent::new(
                    "prompt_optimization",
                    fields
                        .success(false)
                        .error_code(e.code.as_str())
                        .message(e.message),
                ));
                return Ok(prompt);
            }
        };

        let validation = rewritten.validate();
        if !validation.is_valid() {
            warn!(
                "Optimized prompt rejected ({}), keeping original",
                validation.error_message()
            );
            ctx.logger.log(PipelineEvent::new(
                "prompt_optimization",
                fields
                    .success(false)
                    .message(validation.error_message().to_string()),
            ));
            return Ok(prompt);
        }

        info!(
            panels = options.panel_count,
            before = prompt.char_len(),
            after = rewritten.char_len(),
            "Prompt optimized"
        );
        ctx.logger
            .log(PipelineEvent::new("prompt_optimization", fields.success(true)));
        Ok(rewritten)
    }
}
