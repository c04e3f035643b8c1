//! Pipeline stages

use serde::{Deserialize, Serialize};

/// Stage of a comic generation run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ConceptValidation,
    OptionsProcessing,
    PromptBuilding,
    ContentGeneration,
    ImageRendering,
    Assembly,
    Storage,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::ConceptValidation,
        Stage::OptionsProcessing,
        Stage::PromptBuilding,
        Stage::ContentGeneration,
        Stage::ImageRendering,
        Stage::Assembly,
        Stage::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ConceptValidation => "concept_validation",
            Stage::OptionsProcessing => "options_processing",
            Stage::PromptBuilding => "prompt_building",
            Stage::ContentGeneration => "content_generation",
            Stage::ImageRendering => "image_rendering",
            Stage::Assembly => "assembly",
            Stage::Storage => "storage",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::ConceptValidation => "Checking topic",
            Stage::OptionsProcessing => "Preparing options",
            Stage::PromptBuilding => "Writing prompt",
            Stage::ContentGeneration => "Writing story",
            Stage::ImageRendering => "Drawing panels",
            Stage::Assembly => "Assembling comic",
            Stage::Storage => "Saving",
        }
    }

    /// 1-based position, used for progress display
    pub fn position(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }

    /// Whether the stage talks to an external provider
    pub fn is_external(&self) -> bool {
        matches!(self, Stage::ContentGeneration | Stage::ImageRendering)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::ConceptValidation.position(), 1);
        assert_eq!(Stage::Storage.position(), Stage::ALL.len());
        assert!(Stage::PromptBuilding < Stage::ContentGeneration);
    }

    #[test]
    fn test_external_stages() {
        let external: Vec<_> = Stage::ALL.iter().filter(|s| s.is_external()).collect();
        assert_eq!(external, vec![&Stage::ContentGeneration, &Stage::ImageRendering]);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for stage in Stage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, stage.as_str());
        }
    }
}
