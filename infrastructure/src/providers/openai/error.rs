//! HTTP/transport failure mapping

use math_comic_domain::{ApiError, ApiErrorCode};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Longest `Retry-After` hint taken at face value
const MAX_RETRY_AFTER_SECS: f64 = 86_400.0;

/// `Retry-After` in seconds, capped at one day; HTTP-date values are ignored
pub(super) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite())
        .and_then(|secs| Duration::try_from_secs_f64(secs.min(MAX_RETRY_AFTER_SECS)).ok())
}

/// Build an [`ApiError`] from a non-2xx response
pub(super) async fn from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let hint = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    let error = from_status(status, &body);
    match hint {
        Some(delay) => error.with_retry_after(delay),
        None => error,
    }
}

/// Provider error code from the body wins over the HTTP status
pub(super) fn from_status(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let provider_code = parsed.as_ref().and_then(|e| {
        let code = e.code.as_ref().and_then(|c| c.as_str()).map(str::to_string);
        code.into_iter()
            .chain(e.kind.clone())
            .find_map(|c| ApiErrorCode::from_provider_code(&c))
    });
    let code = provider_code.unwrap_or_else(|| ApiErrorCode::from_http_status(status));

    let message = parsed
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    ApiError::new(code, message)
}

pub(super) fn from_transport(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(error.to_string())
    } else if error.is_connect() || error.is_request() {
        ApiError::unavailable(error.to_string())
    } else if error.is_decode() || error.is_body() {
        ApiError::invalid_response(error.to_string())
    } else {
        ApiError::new(ApiErrorCode::Unknown("transport".to_string()), error.to_string())
    }
}
