//! Concept classification configuration from TOML (`[concept]` section)

use math_comic_domain::{ConceptValidator, DifficultyHint, LexiconTerm, MathLexicon};
use math_comic_domain::concept::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Extra lexicon entry, e.g. `{ term = "topology", weight = 1.0, level = "advanced" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLexiconTerm {
    pub term: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub level: Option<DifficultyHint>,
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConceptConfig {
    /// Minimum relevance for a topic to count as mathematical
    pub threshold: f32,
    pub extra_terms: Vec<FileLexiconTerm>,
}

impl Default for FileConceptConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            extra_terms: Vec::new(),
        }
    }
}

impl FileConceptConfig {
    /// Built-in lexicon extended with `extra_terms`
    pub fn to_validator(&self) -> ConceptValidator {
        let lexicon = MathLexicon::builtin().extend(
            self.extra_terms
                .iter()
                .filter(|t| !t.term.trim().is_empty())
                .map(|t| LexiconTerm::new(t.term.trim(), t.weight, t.level)),
        );
        ConceptValidator::new(lexicon, self.threshold)
    }
}
