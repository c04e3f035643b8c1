//! Image-generation gateway

use super::OpenAiEndpoint;
use super::error::{from_response, from_transport};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use math_comic_application::{ImageArtifact, ImageGenerator, ImageRequest};
use math_comic_domain::ApiError;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// [`ImageGenerator`] backed by an OpenAI-compatible images endpoint
pub struct OpenAiImageGateway {
    endpoint: OpenAiEndpoint,
    size: String,
    client: reqwest::Client,
}

impl OpenAiImageGateway {
    pub fn new(endpoint: OpenAiEndpoint, size: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = endpoint.client()?;
        Ok(Self {
            endpoint,
            size: size.into(),
            client,
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGateway {
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageArtifact, ApiError> {
        let body = json!({
            "model": self.endpoint.model,
            "prompt": request.prompt,
            "n": 1,
            "size": self.size,
        });

        let http = self
            .client
            .post(self.endpoint.url("images/generations"))
            .json(&body);
        let response = self
            .endpoint
            .authorize(http)
            .send()
            .await
            .map_err(from_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        let parsed: ImagesResponse = response.json().await.map_err(from_transport)?;
        let data = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::invalid_response("Image response contained no data"))?;

        let artifact = match (data.b64_json, data.url) {
            (Some(encoded), _) => STANDARD
                .decode(encoded.trim())
                .map(ImageArtifact::Bytes)
                .map_err(|e| ApiError::invalid_response(format!("Bad base64 image: {}", e)))?,
            (None, Some(url)) => ImageArtifact::Url(url),
            (None, None) => {
                return Err(ApiError::invalid_response(
                    "Image response had neither b64_json nor url",
                ));
            }
        };

        debug!(panel = request.panel_number, "Image generated");
        Ok(artifact)
    }
}
