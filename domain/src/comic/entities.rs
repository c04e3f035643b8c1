//! Comic entities

use crate::options::{AgeGroup, ComicStyle, GenerationOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Script of a single panel as produced by the content provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelContent {
    pub image_description: String,
    #[serde(default)]
    pub dialogue: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl PanelContent {
    pub fn new(image_description: impl Into<String>) -> Self {
        Self {
            image_description: image_description.into(),
            dialogue: Vec::new(),
            narration: None,
        }
    }

    pub fn with_dialogue(mut self, line: impl Into<String>) -> Self {
        self.dialogue.push(line.into());
        self
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// Full comic script: a title plus ordered panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicContent {
    pub title: String,
    pub panels: Vec<PanelContent>,
}

/// Where a rendered panel image lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub file_name: String,
    pub url: String,
    pub path: String,
}

/// A panel with its rendered image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicPanel {
    /// 1-based position in the comic
    pub number: u8,
    #[serde(flatten)]
    pub content: PanelContent,
    pub image: ImageRef,
}

/// An assembled comic (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiPanelComic {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub options: GenerationOptions,
    pub panels: Vec<ComicPanel>,
    pub created_at: DateTime<Utc>,
}

impl MultiPanelComic {
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// File names of every panel image, in panel order
    pub fn image_files(&self) -> Vec<String> {
        self.panels
            .iter()
            .map(|p| p.image.file_name.clone())
            .collect()
    }

    /// Build the index entry for this comic
    pub fn metadata(&self, image_bytes: u64) -> ComicMetadata {
        ComicMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            topic: self.topic.clone(),
            created_at: self.created_at,
            panel_count: self.panels.len(),
            age_group: self.options.age_group,
            style: self.options.style,
            image_files: self.image_files(),
            image_bytes,
        }
    }
}

/// Index entry for a stored comic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicMetadata {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub panel_count: usize,
    pub age_group: AgeGroup,
    pub style: ComicStyle,
    #[serde(default)]
    pub image_files: Vec<String>,
    /// Total size of the panel images, recorded at save time
    #[serde(default)]
    pub image_bytes: u64,
}

/// Aggregate numbers over the metadata index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComicStatistics {
    pub total_comics: usize,
    pub total_panels: usize,
    pub average_panels: f64,
    pub by_age_group: BTreeMap<String, usize>,
    pub by_style: BTreeMap<String, usize>,
    pub total_image_bytes: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl ComicStatistics {
    pub fn from_metadata<'a>(entries: impl IntoIterator<Item = &'a ComicMetadata>) -> Self {
        let mut stats = Self::default();

        for entry in entries {
            stats.total_comics += 1;
            stats.total_panels += entry.panel_count;
            stats.total_image_bytes += entry.image_bytes;
            *stats
                .by_age_group
                .entry(entry.age_group.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_style
                .entry(entry.style.as_str().to_string())
                .or_default() += 1;

            stats.oldest = Some(match stats.oldest {
                Some(t) if t <= entry.created_at => t,
                _ => entry.created_at,
            });
            stats.newest = Some(match stats.newest {
                Some(t) if t >= entry.created_at => t,
                _ => entry.created_at,
            });
        }

        if stats.total_comics > 0 {
            stats.average_panels = stats.total_panels as f64 / stats.total_comics as f64;
        }
        stats
    }
}

/// Export format for a stored comic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
    /// tar.gz archive of `comic.json` plus every panel image
    Bundle,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Bundle => "bundle",
        }
    }

    /// Conventional file extension for the exported payload
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Bundle => "tar.gz",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "bundle" | "tar.gz" | "tgz" => Ok(ExportFormat::Bundle),
            other => Err(format!(
                "Unsupported export format '{}' (expected json, markdown or bundle)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata(id: &str, panels: usize, age: AgeGroup, day: u32, bytes: u64) -> ComicMetadata {
        ComicMetadata {
            id: id.to_string(),
            title: format!("Comic {}", id),
            topic: "addition".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            panel_count: panels,
            age_group: age,
            style: ComicStyle::Cartoon,
            image_files: Vec::new(),
            image_bytes: bytes,
        }
    }

    #[test]
    fn test_statistics_aggregate_index() {
        let entries = vec![
            metadata("a", 4, AgeGroup::Child, 2, 100),
            metadata("b", 6, AgeGroup::Teen, 1, 50),
            metadata("c", 2, AgeGroup::Child, 3, 0),
        ];
        let stats = ComicStatistics::from_metadata(&entries);

        assert_eq!(stats.total_comics, 3);
        assert_eq!(stats.total_panels, 12);
        assert!((stats.average_panels - 4.0).abs() < f64::EPSILON);
        assert_eq!(stats.by_age_group.get("child"), Some(&2));
        assert_eq!(stats.by_age_group.get("teen"), Some(&1));
        assert_eq!(stats.by_style.get("cartoon"), Some(&3));
        assert_eq!(stats.total_image_bytes, 150);
        assert_eq!(stats.oldest, Some(entries[1].created_at));
        assert_eq!(stats.newest, Some(entries[2].created_at));
    }

    #[test]
    fn test_statistics_empty() {
        let stats = ComicStatistics::from_metadata(&[]);
        assert_eq!(stats.total_comics, 0);
        assert_eq!(stats.average_panels, 0.0);
        assert!(stats.oldest.is_none());
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("MD".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert_eq!("bundle".parse::<ExportFormat>(), Ok(ExportFormat::Bundle));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_panel_flattens_content() {
        let panel = ComicPanel {
            number: 1,
            content: PanelContent::new("Two apples").with_dialogue("1 + 1 = 2"),
            image: ImageRef {
                file_name: "panel_01_x.png".to_string(),
                url: "/images/panel_01_x.png".to_string(),
                path: "/tmp/panel_01_x.png".to_string(),
            },
        };
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["image_description"], "Two apples");
        assert_eq!(json["dialogue"][0], "1 + 1 = 2");
        assert!(json.get("narration").is_none());

        let back: ComicPanel = serde_json::from_value(json).unwrap();
        assert_eq!(back, panel);
    }
}
