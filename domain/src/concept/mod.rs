//! Concept domain
//!
//! Classifies raw topic text as mathematical and extracts a [`MathConcept`].

mod entities;
pub mod lexicon;
mod validator;

pub use entities::{DifficultyHint, MathConcept};
pub use lexicon::{LexiconTerm, MathLexicon};
pub use validator::{ConceptValidator, DEFAULT_THRESHOLD, MAX_INPUT_CHARS, tokenize};
