//! Generated prompt pair and its validation

use super::template::PromptTemplate;
use crate::concept::MathConcept;
use crate::core::validation::ValidationResult;
use crate::options::GenerationOptions;
use serde::{Deserialize, Serialize};

/// Upper bound on system + user prompt length, in characters
pub const MAX_PROMPT_CHARS: usize = 6000;

/// A system/user prompt pair ready for the content gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptGenerationResponse {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Panel count the prompt asks for
    pub panel_count: u8,
}

impl PromptGenerationResponse {
    /// Build the prompt pair from a concept and options
    pub fn build(concept: &MathConcept, options: &GenerationOptions) -> Self {
        Self {
            system_prompt: PromptTemplate::comic_system(options),
            user_prompt: PromptTemplate::comic_user(concept, options),
            panel_count: options.panel_count,
        }
    }

    /// Same prompt with a different user message
    pub fn with_user_prompt(&self, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: self.system_prompt.clone(),
            user_prompt: user_prompt.into(),
            panel_count: self.panel_count,
        }
    }

    pub fn char_len(&self) -> usize {
        self.system_prompt.chars().count() + self.user_prompt.chars().count()
    }

    /// Reject empty prompts, oversized prompts, and prompts without the
    /// panel-count directive
    pub fn validate(&self) -> ValidationResult {
        if self.system_prompt.trim().is_empty() || self.user_prompt.trim().is_empty() {
            return ValidationResult::invalid(
                "Prompt is empty",
                vec!["Regenerate the prompt from the topic".to_string()],
            );
        }

        let len = self.char_len();
        if len > MAX_PROMPT_CHARS {
            return ValidationResult::invalid(
                format!(
                    "Prompt is {} characters long, the limit is {}",
                    len, MAX_PROMPT_CHARS
                ),
                vec!["Use a shorter topic with fewer keywords".to_string()],
            );
        }

        let directive = PromptTemplate::panel_directive(self.panel_count);
        if !self.user_prompt.contains(&directive) {
            return ValidationResult::invalid(
                format!("Prompt does not ask for {}", directive),
                vec!["Regenerate the prompt from the topic".to_string()],
            );
        }

        ValidationResult::valid()
    }
}
