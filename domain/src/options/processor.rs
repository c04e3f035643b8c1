//! Options validation, defaulting and age-group adjustment
//!
//! Every function here is pure: the processor only holds the default option
//! set it was built with.

use super::entities::{
    AgeGroup, ComicStyle, DetailLevel, GenerationOptions, MAX_LANGUAGE_LEN, MAX_PANELS,
    MIN_PANELS, OptionsInput,
};
use crate::core::validation::ValidationResult;

#[derive(Debug, Clone, Default)]
pub struct OptionsProcessor {
    defaults: GenerationOptions,
}

impl OptionsProcessor {
    pub fn new(defaults: GenerationOptions) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &GenerationOptions {
        &self.defaults
    }

    /// Check bounds of a fully populated option set
    pub fn validate_options(&self, options: &GenerationOptions) -> ValidationResult {
        if !(MIN_PANELS..=MAX_PANELS).contains(&options.panel_count) {
            return ValidationResult::invalid(
                format!(
                    "Panel count must be between {} and {}, got {}",
                    MIN_PANELS, MAX_PANELS, options.panel_count
                ),
                vec![format!(
                    "Use {} panels, or any value from {} to {}",
                    self.defaults.panel_count.clamp(MIN_PANELS, MAX_PANELS),
                    MIN_PANELS,
                    MAX_PANELS
                )],
            );
        }

        let language = options.language.trim();
        if language.is_empty() {
            return ValidationResult::invalid(
                "Language cannot be empty",
                vec![format!("Use a language tag such as '{}'", self.defaults.language)],
            );
        }
        if language.chars().count() > MAX_LANGUAGE_LEN {
            return ValidationResult::invalid(
                format!("Language tag is longer than {} characters", MAX_LANGUAGE_LEN),
                vec!["Use a short language tag such as 'zh-CN' or 'en'".to_string()],
            );
        }

        ValidationResult::valid()
    }

    /// Fill in every missing field from the defaults; total over all inputs
    pub fn apply_defaults(&self, input: Option<OptionsInput>) -> GenerationOptions {
        let input = input.unwrap_or_default();
        let defaults = &self.defaults;

        GenerationOptions {
            age_group: input.age_group.unwrap_or(defaults.age_group),
            panel_count: input.panel_count.unwrap_or(defaults.panel_count),
            style: input.style.unwrap_or(defaults.style),
            language: input
                .language
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| defaults.language.clone()),
            include_narration: input.include_narration.unwrap_or(defaults.include_narration),
            detail_level: input.detail_level.unwrap_or(defaults.detail_level),
        }
    }

    /// Tailor options to an audience without leaving the supported bound
    pub fn adjust_for_age_group(
        &self,
        options: GenerationOptions,
        age_group: AgeGroup,
    ) -> GenerationOptions {
        let mut adjusted = options;
        adjusted.age_group = age_group;
        adjusted.panel_count = adjusted
            .panel_count
            .clamp(MIN_PANELS, age_group.max_panels().min(MAX_PANELS));

        match age_group {
            AgeGroup::Child => {
                adjusted.detail_level = DetailLevel::Simple;
                adjusted.include_narration = true;
                if adjusted.style == ComicStyle::Realistic {
                    adjusted.style = ComicStyle::Cartoon;
                }
            }
            AgeGroup::Teen => {
                adjusted.detail_level = DetailLevel::Standard;
            }
            AgeGroup::Adult => {
                adjusted.detail_level = DetailLevel::Detailed;
            }
        }

        adjusted
    }

    /// Whether the option set contains no contradictory combination
    pub fn are_options_consistent(&self, options: &GenerationOptions) -> bool {
        self.inconsistency(options).is_none()
    }

    /// Description of the first contradiction found, if any
    pub fn inconsistency(&self, options: &GenerationOptions) -> Option<String> {
        if !(MIN_PANELS..=MAX_PANELS).contains(&options.panel_count) {
            return Some(format!(
                "panel count {} is outside {}..={}",
                options.panel_count, MIN_PANELS, MAX_PANELS
            ));
        }
        if options.style.requires_narration() && !options.include_narration {
            return Some(format!(
                "style '{}' requires narration, but narration is disabled",
                options.style
            ));
        }
        if options.age_group == AgeGroup::Child && options.detail_level == DetailLevel::Detailed {
            return Some("detailed vocabulary is not suitable for a child audience".to_string());
        }
        None
    }
}
