//! OpenAI-compatible HTTP adapters
//!
//! [`OpenAiContentGateway`] implements [`ContentGateway`] over
//! `POST {base_url}/chat/completions`; [`OpenAiImageGateway`] implements
//! [`ImageGenerator`] over `POST {base_url}/images/generations`. Both map
//! HTTP and transport failures onto [`ApiError`] codes so the retry layer
//! can classify them.
//!
//! [`ContentGateway`]: math_comic_application::ContentGateway
//! [`ImageGenerator`]: math_comic_application::ImageGenerator
//! [`ApiError`]: math_comic_domain::ApiError

mod content;
mod error;
mod image;

pub use content::OpenAiContentGateway;
pub use image::OpenAiImageGateway;

use std::time::Duration;

/// Connection settings shared by both adapters
#[derive(Debug, Clone)]
pub struct OpenAiEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiEndpoint {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}
