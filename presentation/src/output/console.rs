//! Console output formatter for comics

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use math_comic_domain::{ComicMetadata, ComicStatistics, ErrorResponse, MultiPanelComic};

/// Formats comics for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colors off (or back to terminal detection)
    pub fn set_color(enabled: bool) {
        if enabled {
            colored::control::unset_override();
        } else {
            colored::control::set_override(false);
        }
    }

    /// Format the complete comic
    pub fn format(comic: &MultiPanelComic) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&comic.title));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Topic:".cyan().bold(), comic.topic));
        output.push_str(&format!(
            "{} {} / {} / {} panels\n",
            "Options:".cyan().bold(),
            comic.options.age_group.as_str(),
            comic.options.style.as_str(),
            comic.panel_count()
        ));
        output.push_str(&format!("{} {}\n", "ID:".cyan().bold(), comic.id));

        for panel in &comic.panels {
            output.push_str(&Self::section_header(&format!("Panel {}", panel.number)));
            output.push_str(&format!(
                "{}\n",
                Self::indent(&panel.content.image_description, "  ").dimmed()
            ));

            for line in &panel.content.dialogue {
                output.push_str(&format!("  {} {}\n", ">".yellow().bold(), line));
            }
            if let Some(narration) = &panel.content.narration {
                output.push_str(&format!("  {}\n", narration.italic()));
            }
            output.push_str(&format!(
                "  {} {}\n",
                "image:".dimmed(),
                panel.image.url.underline()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(comic: &MultiPanelComic) -> String {
        serde_json::to_string_pretty(comic).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the stored-comic listing
    pub fn format_list(entries: &[ComicMetadata]) -> String {
        if entries.is_empty() {
            return format!("{}\n", "No comics stored yet.".dimmed());
        }

        let mut output = String::new();
        for entry in entries {
            output.push_str(&format!(
                "{}  {}  {}\n",
                entry.id.yellow(),
                entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                entry.title.bold()
            ));
            output.push_str(&format!(
                "    {} | {} | {} | {} panels\n",
                entry.topic,
                entry.age_group.as_str(),
                entry.style.as_str(),
                entry.panel_count
            ));
        }
        output.push_str(&format!("\n{} comic(s)\n", entries.len()));
        output
    }

    pub fn format_statistics(stats: &ComicStatistics) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Comic Statistics"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Comics:".cyan().bold(), stats.total_comics));
        output.push_str(&format!(
            "{} {} ({:.1} per comic)\n",
            "Panels:".cyan().bold(),
            stats.total_panels,
            stats.average_panels
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Images:".cyan().bold(),
            Self::human_bytes(stats.total_image_bytes)
        ));

        if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
            output.push_str(&format!(
                "{} {} .. {}\n",
                "Range:".cyan().bold(),
                oldest.format("%Y-%m-%d"),
                newest.format("%Y-%m-%d")
            ));
        }

        if !stats.by_age_group.is_empty() {
            output.push_str(&Self::section_header("By age group"));
            for (age, count) in &stats.by_age_group {
                output.push_str(&format!("  {:<12} {}\n", age, count));
            }
        }
        if !stats.by_style.is_empty() {
            output.push_str(&Self::section_header("By style"));
            for (style, count) in &stats.by_style {
                output.push_str(&format!("  {:<12} {}\n", style, count));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format a user-facing failure
    pub fn format_error(error: &ErrorResponse) -> String {
        let mut output = format!("{} {}\n", "Error:".red().bold(), error.user_message);

        if error.should_retry {
            let when = match error.retry_after {
                Some(delay) => format!("in about {}s", delay.as_secs().max(1)),
                None => "later".to_string(),
            };
            output.push_str(&format!("{} {}\n", "Retry:".yellow(), when));
        }

        if !error.resolution_steps.is_empty() {
            output.push_str(&format!("{}\n", "What you can do:".cyan()));
            for step in &error.resolution_steps {
                output.push_str(&format!("  * {}\n", step));
            }
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    fn human_bytes(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", bytes, UNITS[0])
        } else {
            format!("{:.1} {}", value, UNITS[unit])
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, comic: &MultiPanelComic) -> String {
        Self::format(comic)
    }

    fn format_json(&self, comic: &MultiPanelComic) -> String {
        Self::format_json(comic)
    }

    fn format_list(&self, entries: &[ComicMetadata]) -> String {
        Self::format_list(entries)
    }

    fn format_statistics(&self, stats: &ComicStatistics) -> String {
        Self::format_statistics(stats)
    }

    fn format_error(&self, error: &ErrorResponse) -> String {
        Self::format_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_lists_resolution_steps() {
        colored::control::set_override(false);
        let error = ErrorResponse::permanent(
            "The topic does not look like math",
            vec!["Try \"加法运算\"".to_string()],
        );
        let text = ConsoleFormatter::format_error(&error);
        assert!(text.contains("Error: The topic does not look like math"));
        assert!(text.contains("  * Try \"加法运算\""));
        assert!(!text.contains("Retry:"));
    }

    #[test]
    fn test_transient_error_shows_retry_hint() {
        colored::control::set_override(false);
        let error = ErrorResponse::transient("Busy", Some(Duration::from_secs(5)));
        let text = ConsoleFormatter::format_error(&error);
        assert!(text.contains("Retry: in about 5s"));
    }

    #[test]
    fn test_empty_list() {
        colored::control::set_override(false);
        assert_eq!(ConsoleFormatter::format_list(&[]), "No comics stored yet.\n");
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(ConsoleFormatter::human_bytes(512), "512 B");
        assert_eq!(ConsoleFormatter::human_bytes(1536), "1.5 KiB");
        assert_eq!(ConsoleFormatter::human_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
