//! Domain layer for math-comic
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Pipeline
//!
//! A math topic flows through a fixed sequence of gates:
//!
//! - **Concept**: the topic is classified as mathematical and a
//!   [`MathConcept`] is extracted
//! - **Options**: caller input is normalized into [`GenerationOptions`]
//! - **Prompt**: a [`PromptGenerationResponse`] is built and validated
//! - **Generation**: provider errors are classified into [`ErrorResponse`]
//!   under a [`RetryPolicy`]
//! - **Comic**: the provider script is parsed and assembled into a
//!   [`MultiPanelComic`]

pub mod comic;
pub mod concept;
pub mod core;
pub mod generation;
pub mod options;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use comic::{
    ComicAssembler, ComicContent, ComicMetadata, ComicPanel, ComicStatistics, ExportFormat,
    ImageRef, MultiPanelComic, PanelContent, ScriptError, parse_comic_content,
};
pub use concept::{ConceptValidator, DifficultyHint, LexiconTerm, MathConcept, MathLexicon};
pub use core::{error::DomainError, validation::ValidationResult};
pub use generation::{ApiError, ApiErrorCode, ErrorResponse, RetryPolicy};
pub use options::{
    AgeGroup, ComicStyle, DetailLevel, GenerationOptions, MAX_PANELS, MIN_PANELS, OptionsInput,
    OptionsProcessor,
};
pub use pipeline::Stage;
pub use prompt::{MAX_PROMPT_CHARS, PromptGenerationResponse, PromptTemplate};
