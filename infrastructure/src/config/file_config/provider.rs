//! Provider configuration from TOML (`[provider]` and `[image]` sections)

use serde::{Deserialize, Serialize};

/// Text-generation provider configuration (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Base URL including the API version prefix.
    pub base_url: String,
    pub model: String,
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended — use env var instead).
    pub api_key: Option<String>,
    /// Transport timeout per request.
    pub timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 60,
            temperature: 0.7,
        }
    }
}

impl FileProviderConfig {
    /// Direct key if set, otherwise the value of `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Image-generation provider configuration (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileImageConfig {
    pub base_url: String,
    pub model: String,
    /// Requested image size, e.g. "1024x1024".
    pub size: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for FileImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

impl FileImageConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

fn resolve_key(direct: Option<&str>, env_name: &str) -> Option<String> {
    direct
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok())
        .filter(|k| !k.trim().is_empty())
}
