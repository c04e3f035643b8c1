//! Chat-completions content gateway

use super::OpenAiEndpoint;
use super::error::{from_response, from_transport};
use async_trait::async_trait;
use math_comic_application::ContentGateway;
use math_comic_domain::ApiError;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`ContentGateway`] backed by an OpenAI-compatible chat endpoint
pub struct OpenAiContentGateway {
    endpoint: OpenAiEndpoint,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiContentGateway {
    pub fn new(endpoint: OpenAiEndpoint, temperature: f32) -> Result<Self, reqwest::Error> {
        let client = endpoint.client()?;
        Ok(Self {
            endpoint,
            temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.endpoint.model
    }
}

#[async_trait]
impl ContentGateway for OpenAiContentGateway {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ApiError> {
        let body = json!({
            "model": self.endpoint.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let request = self
            .client
            .post(self.endpoint.url("chat/completions"))
            .json(&body);
        let response = self
            .endpoint
            .authorize(request)
            .send()
            .await
            .map_err(from_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        let parsed: ChatResponse = response.json().await.map_err(from_transport)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::invalid_response("Response contained no message content"))?;

        debug!(model = %self.endpoint.model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use math_comic_domain::ApiErrorCode;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> OpenAiContentGateway {
        let endpoint = OpenAiEndpoint::new(format!("{}/v1", server.uri()), "test-model")
            .with_api_key(Some("sk-test".to_string()))
            .with_timeout(Duration::from_millis(500));
        OpenAiContentGateway::new(endpoint, 0.2).unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"title\":\"t\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = gateway(&server).complete("sys", "usr").await.unwrap();
        assert_eq!(content, "{\"title\":\"t\"}");
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "2")
                    .set_body_json(json!({
                        "error": { "message": "slow down", "type": "requests", "code": "rate_limit_exceeded" }
                    })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).complete("sys", "usr").await.unwrap_err();
        assert_eq!(error.code, ApiErrorCode::RateLimited);
        assert_eq!(error.retry_after, Some(Duration::from_secs(2)));
        assert_eq!(error.message, "slow down");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_from_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = gateway(&server).complete("sys", "usr").await.unwrap_err();
        assert_eq!(error.code, ApiErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let error = gateway(&server).complete("sys", "usr").await.unwrap_err();
        assert_eq!(error.code, ApiErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let error = gateway(&server).complete("sys", "usr").await.unwrap_err();
        assert_eq!(error.code, ApiErrorCode::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let endpoint = OpenAiEndpoint::new("http://127.0.0.1:9/v1", "m")
            .with_timeout(Duration::from_secs(2));
        let gateway = OpenAiContentGateway::new(endpoint, 0.0).unwrap();

        let error = gateway.complete("sys", "usr").await.unwrap_err();
        assert!(matches!(
            error.code,
            ApiErrorCode::ServiceUnavailable | ApiErrorCode::Timeout
        ));
    }
}
