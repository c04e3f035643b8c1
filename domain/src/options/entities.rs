//! Generation option entities

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest supported panel count
pub const MIN_PANELS: u8 = 1;
/// Largest supported panel count
pub const MAX_PANELS: u8 = 8;
/// Longest accepted language tag
pub const MAX_LANGUAGE_LEN: usize = 16;

/// Target audience of a comic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    #[default]
    Child,
    Teen,
    Adult,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teen => "teen",
            AgeGroup::Adult => "adult",
        }
    }

    /// Largest panel count suitable for this audience
    pub fn max_panels(&self) -> u8 {
        match self {
            AgeGroup::Child => 4,
            AgeGroup::Teen => 6,
            AgeGroup::Adult => MAX_PANELS,
        }
    }

    /// Audience description used in prompts
    pub fn audience(&self) -> &'static str {
        match self {
            AgeGroup::Child => "children aged 6 to 10",
            AgeGroup::Teen => "teenagers aged 11 to 17",
            AgeGroup::Adult => "adult learners",
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "child" | "children" | "kid" | "kids" => Ok(AgeGroup::Child),
            "teen" | "teenager" => Ok(AgeGroup::Teen),
            "adult" => Ok(AgeGroup::Adult),
            other => Err(format!("unknown age group: {}", other)),
        }
    }
}

/// Visual style of the comic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComicStyle {
    #[default]
    Cartoon,
    Watercolor,
    Manga,
    Realistic,
    /// Picture-book style; every panel carries narration
    Storybook,
}

impl ComicStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComicStyle::Cartoon => "cartoon",
            ComicStyle::Watercolor => "watercolor",
            ComicStyle::Manga => "manga",
            ComicStyle::Realistic => "realistic",
            ComicStyle::Storybook => "storybook",
        }
    }

    pub fn requires_narration(&self) -> bool {
        matches!(self, ComicStyle::Storybook)
    }

    /// Rendering cue appended to image prompts
    pub fn image_cue(&self) -> &'static str {
        match self {
            ComicStyle::Cartoon => "bright flat-colour cartoon illustration, bold outlines",
            ComicStyle::Watercolor => "soft watercolour illustration, gentle textures",
            ComicStyle::Manga => "black-and-white manga panel, screentone shading",
            ComicStyle::Realistic => "realistic digital painting, natural lighting",
            ComicStyle::Storybook => "warm children's picture-book illustration",
        }
    }
}

impl std::fmt::Display for ComicStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComicStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cartoon" => Ok(ComicStyle::Cartoon),
            "watercolor" | "watercolour" => Ok(ComicStyle::Watercolor),
            "manga" => Ok(ComicStyle::Manga),
            "realistic" => Ok(ComicStyle::Realistic),
            "storybook" => Ok(ComicStyle::Storybook),
            other => Err(format!("unknown comic style: {}", other)),
        }
    }
}

/// Vocabulary and narration density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Simple,
    #[default]
    Standard,
    Detailed,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Simple => "simple",
            DetailLevel::Standard => "standard",
            DetailLevel::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(DetailLevel::Simple),
            "standard" => Ok(DetailLevel::Standard),
            "detailed" => Ok(DetailLevel::Detailed),
            other => Err(format!("unknown detail level: {}", other)),
        }
    }
}

/// Fully populated generation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub age_group: AgeGroup,
    pub panel_count: u8,
    pub style: ComicStyle,
    pub language: String,
    pub include_narration: bool,
    pub detail_level: DetailLevel,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            age_group: AgeGroup::Child,
            panel_count: 4,
            style: ComicStyle::Cartoon,
            language: "zh-CN".to_string(),
            include_narration: true,
            detail_level: DetailLevel::Standard,
        }
    }
}

/// Caller-supplied options; anything left out is defaulted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsInput {
    pub age_group: Option<AgeGroup>,
    pub panel_count: Option<u8>,
    pub style: Option<ComicStyle>,
    pub language: Option<String>,
    pub include_narration: Option<bool>,
    pub detail_level: Option<DetailLevel>,
}

impl From<GenerationOptions> for OptionsInput {
    fn from(options: GenerationOptions) -> Self {
        Self {
            age_group: Some(options.age_group),
            panel_count: Some(options.panel_count),
            style: Some(options.style),
            language: Some(options.language),
            include_narration: Some(options.include_narration),
            detail_level: Some(options.detail_level),
        }
    }
}
