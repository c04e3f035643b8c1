//! Generation options domain
//!
//! Caller input ([`OptionsInput`]) is normalized into [`GenerationOptions`]
//! by the [`OptionsProcessor`].

mod entities;
mod processor;

pub use entities::{
    AgeGroup, ComicStyle, DetailLevel, GenerationOptions, MAX_LANGUAGE_LEN, MAX_PANELS,
    MIN_PANELS, OptionsInput,
};
pub use processor::OptionsProcessor;
