//! Provider adapters
//!
//! Only OpenAI-compatible HTTP APIs are supported; any server speaking the
//! chat-completions and images-generations protocol works via `base_url`.

pub mod openai;
