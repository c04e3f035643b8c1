//! Concept validation and extraction

use super::entities::{DifficultyHint, MathConcept};
use super::lexicon::{EXAMPLE_TOPICS_CJK, EXAMPLE_TOPICS_LATIN, MathLexicon};
use crate::core::error::DomainError;
use crate::core::string::{contains_cjk, truncate_chars};
use crate::core::validation::ValidationResult;

/// Maximum accepted topic length, in characters
pub const MAX_INPUT_CHARS: usize = 200;

/// Default relevance threshold
pub const DEFAULT_THRESHOLD: f32 = 1.0;

/// Token delimiters besides whitespace
const DELIMITERS: &[char] = &[
    '，', ',', '。', '.', '、', '；', ';', '？', '?', '！', '!', '：', ':',
];

/// Split raw input into non-empty tokens
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || DELIMITERS.contains(&c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-token scoring of an input
struct Analysis {
    /// (token, weight, level) for every token that matched, in input order
    matches: Vec<(String, f32, Option<DifficultyHint>)>,
    relevance: f32,
}

/// Classifies free text as mathematical and extracts a [`MathConcept`]
#[derive(Debug, Clone)]
pub struct ConceptValidator {
    lexicon: MathLexicon,
    threshold: f32,
}

impl ConceptValidator {
    pub fn new(lexicon: MathLexicon, threshold: f32) -> Self {
        Self { lexicon, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Validate raw input; never fails for malformed input
    pub fn validate_input(&self, raw: &str) -> ValidationResult {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return ValidationResult::invalid(
                "Please enter a math topic",
                self.get_suggestions(raw),
            );
        }

        if trimmed.chars().count() > MAX_INPUT_CHARS {
            let mut suggestions = vec![format!(
                "Shorten the topic to at most {} characters",
                MAX_INPUT_CHARS
            )];
            suggestions.extend(self.get_suggestions(raw));
            return ValidationResult::invalid("The topic is too long", suggestions);
        }

        if !self.is_mathematical_content(trimmed) {
            return ValidationResult::invalid(
                format!(
                    "'{}' does not look like a math topic",
                    truncate_chars(trimmed, 40)
                ),
                self.get_suggestions(raw),
            );
        }

        ValidationResult::valid()
    }

    /// Whether the input reaches the relevance threshold
    pub fn is_mathematical_content(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.analyze(trimmed).relevance >= self.threshold
    }

    /// Extract the concept from input already classified as mathematical
    ///
    /// Calling this on non-mathematical input is a contract violation and
    /// returns [`DomainError::NotMathematical`].
    pub fn parse_math_concept(&self, raw: &str) -> Result<MathConcept, DomainError> {
        let trimmed = raw.trim();
        let analysis = self.analyze(trimmed);
        if trimmed.is_empty() || analysis.relevance < self.threshold {
            return Err(DomainError::NotMathematical(truncate_chars(trimmed, 40)));
        }

        // Highest-scoring token wins; the first one wins ties
        let mut topic: Option<(&str, f32)> = None;
        for (token, weight, _) in &analysis.matches {
            if topic.is_none_or(|(_, best)| *weight > best) {
                topic = Some((token.as_str(), *weight));
            }
        }
        let topic = topic
            .map(|(t, _)| t.to_string())
            .ok_or_else(|| DomainError::NotMathematical(truncate_chars(trimmed, 40)))?;

        let mut keywords: Vec<String> = Vec::new();
        for (token, _, _) in &analysis.matches {
            if !keywords.contains(token) {
                keywords.push(token.clone());
            }
        }

        let difficulty = analysis.matches.iter().filter_map(|(_, _, level)| *level).max();

        Ok(MathConcept::new(topic, keywords, difficulty))
    }

    /// Example topics for a rejected input, input's script first
    pub fn get_suggestions(&self, raw: &str) -> Vec<String> {
        let trimmed = raw.trim();
        let mut suggestions = Vec::new();

        if !trimmed.is_empty() {
            let relevance = self.analyze(trimmed).relevance;
            if relevance > 0.0 && relevance < self.threshold {
                suggestions.push(
                    "Be more specific, e.g. name the operation or shape you want to learn about"
                        .to_string(),
                );
            }
        }

        let (first, second) = if contains_cjk(trimmed) || trimmed.is_empty() {
            (EXAMPLE_TOPICS_CJK, EXAMPLE_TOPICS_LATIN)
        } else {
            (EXAMPLE_TOPICS_LATIN, EXAMPLE_TOPICS_CJK)
        };
        suggestions.extend(first.iter().chain(second.iter()).map(|s| s.to_string()));
        suggestions
    }

    fn analyze(&self, trimmed: &str) -> Analysis {
        let mut matches = Vec::new();
        let mut relevance = 0.0;

        for token in tokenize(trimmed) {
            if let Some(score) = self.lexicon.score_token(&token) {
                relevance += score.weight;
                matches.push((token, score.weight, score.level));
            }
        }

        Analysis { matches, relevance }
    }
}

impl Default for ConceptValidator {
    fn default() -> Self {
        Self::new(MathLexicon::builtin(), DEFAULT_THRESHOLD)
    }
}
