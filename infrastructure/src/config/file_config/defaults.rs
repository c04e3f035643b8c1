//! Default generation options from TOML (`[defaults]` section)

use math_comic_domain::{AgeGroup, ComicStyle, DetailLevel, GenerationOptions, OptionsProcessor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDefaultsConfig {
    pub age_group: AgeGroup,
    pub panel_count: u8,
    pub style: ComicStyle,
    pub language: String,
    pub include_narration: bool,
    pub detail_level: DetailLevel,
}

impl Default for FileDefaultsConfig {
    fn default() -> Self {
        GenerationOptions::default().into()
    }
}

impl From<GenerationOptions> for FileDefaultsConfig {
    fn from(o: GenerationOptions) -> Self {
        Self {
            age_group: o.age_group,
            panel_count: o.panel_count,
            style: o.style,
            language: o.language,
            include_narration: o.include_narration,
            detail_level: o.detail_level,
        }
    }
}

impl FileDefaultsConfig {
    pub fn to_generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            age_group: self.age_group,
            panel_count: self.panel_count,
            style: self.style,
            language: self.language.clone(),
            include_narration: self.include_narration,
            detail_level: self.detail_level,
        }
    }

    pub fn to_options_processor(&self) -> OptionsProcessor {
        OptionsProcessor::new(self.to_generation_options())
    }
}
