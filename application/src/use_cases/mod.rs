//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod build_prompt;
pub mod generate_comic;
pub mod generate_content;
pub mod render_images;
pub(crate) mod shared;
