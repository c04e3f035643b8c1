//! Prompt domain
//!
//! Templates for the comic script, prompt optimization and panel images, plus
//! the validated [`PromptGenerationResponse`] pair.

mod request;
mod template;

pub use request::{MAX_PROMPT_CHARS, PromptGenerationResponse};
pub use template::PromptTemplate;
