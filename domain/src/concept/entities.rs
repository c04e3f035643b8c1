//! Concept entities

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rough difficulty of a mathematical topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyHint {
    Elementary,
    Intermediate,
    Advanced,
}

impl DifficultyHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyHint::Elementary => "elementary",
            DifficultyHint::Intermediate => "intermediate",
            DifficultyHint::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for DifficultyHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DifficultyHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elementary" => Ok(DifficultyHint::Elementary),
            "intermediate" => Ok(DifficultyHint::Intermediate),
            "advanced" => Ok(DifficultyHint::Advanced),
            other => Err(format!("unknown difficulty level: {}", other)),
        }
    }
}

/// A validated mathematical concept extracted from free text (Value Object)
///
/// Only [`ConceptValidator::parse_math_concept`](super::ConceptValidator::parse_math_concept)
/// creates these, so the topic is always non-empty and the keywords are
/// always tokens of the original input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathConcept {
    topic: String,
    keywords: Vec<String>,
    difficulty_hint: Option<DifficultyHint>,
}

impl MathConcept {
    pub(crate) fn new(
        topic: String,
        keywords: Vec<String>,
        difficulty_hint: Option<DifficultyHint>,
    ) -> Self {
        debug_assert!(!topic.trim().is_empty());
        Self {
            topic,
            keywords,
            difficulty_hint,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn difficulty_hint(&self) -> Option<DifficultyHint> {
        self.difficulty_hint
    }
}

impl std::fmt::Display for MathConcept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.topic)
    }
}
