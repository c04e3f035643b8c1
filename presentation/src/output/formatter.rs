//! Output formatter trait

use math_comic_domain::{ComicMetadata, ComicStatistics, ErrorResponse, MultiPanelComic};

/// Trait for rendering comics and store listings
pub trait OutputFormatter {
    /// Format a complete comic
    fn format(&self, comic: &MultiPanelComic) -> String;

    /// Format as JSON
    fn format_json(&self, comic: &MultiPanelComic) -> String;

    /// Format the stored-comic listing
    fn format_list(&self, entries: &[ComicMetadata]) -> String;

    fn format_statistics(&self, stats: &ComicStatistics) -> String;

    /// Format a user-facing failure
    fn format_error(&self, error: &ErrorResponse) -> String;
}
