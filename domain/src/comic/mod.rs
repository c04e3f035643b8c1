//! Comic domain
//!
//! Script parsing, the assembled [`MultiPanelComic`] entity, storage metadata
//! and export formats.

pub mod assembler;
mod entities;
mod parsing;

pub use assembler::ComicAssembler;
pub use entities::{
    ComicContent, ComicMetadata, ComicPanel, ComicStatistics, ExportFormat, ImageRef,
    MultiPanelComic, PanelContent,
};
pub use parsing::{ScriptError, parse_comic_content, parse_comic_json};
