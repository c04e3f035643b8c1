//! Provider error value objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Normalized provider error code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    RateLimited,
    Timeout,
    ServiceUnavailable,
    ServerError,
    /// The provider answered, but the answer was not a usable comic script
    InvalidResponse,
    Unauthorized,
    InvalidRequest,
    QuotaExceeded,
    ContentFiltered,
    ModelNotFound,
    Unknown(String),
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ApiErrorCode::RateLimited => "rate_limited",
            ApiErrorCode::Timeout => "timeout",
            ApiErrorCode::ServiceUnavailable => "service_unavailable",
            ApiErrorCode::ServerError => "server_error",
            ApiErrorCode::InvalidResponse => "invalid_response",
            ApiErrorCode::Unauthorized => "unauthorized",
            ApiErrorCode::InvalidRequest => "invalid_request",
            ApiErrorCode::QuotaExceeded => "quota_exceeded",
            ApiErrorCode::ContentFiltered => "content_filtered",
            ApiErrorCode::ModelNotFound => "model_not_found",
            ApiErrorCode::Unknown(code) => code,
        }
    }

    /// Map an HTTP status from the provider
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => ApiErrorCode::RateLimited,
            408 | 504 => ApiErrorCode::Timeout,
            502 | 503 => ApiErrorCode::ServiceUnavailable,
            500 => ApiErrorCode::ServerError,
            401 | 403 => ApiErrorCode::Unauthorized,
            400 | 422 => ApiErrorCode::InvalidRequest,
            402 => ApiErrorCode::QuotaExceeded,
            404 => ApiErrorCode::ModelNotFound,
            other => ApiErrorCode::Unknown(format!("http_{}", other)),
        }
    }

    /// Map a provider-specific error code string; `None` if unrecognized
    pub fn from_provider_code(code: &str) -> Option<Self> {
        let code = match code.trim().to_lowercase().as_str() {
            "rate_limit_exceeded" | "rate_limited" | "too_many_requests" => {
                ApiErrorCode::RateLimited
            }
            "timeout" | "request_timeout" => ApiErrorCode::Timeout,
            "overloaded" | "service_unavailable" | "engine_overloaded" => {
                ApiErrorCode::ServiceUnavailable
            }
            "server_error" | "internal_error" => ApiErrorCode::ServerError,
            "invalid_api_key" | "unauthorized" | "permission_denied" => {
                ApiErrorCode::Unauthorized
            }
            "invalid_request" | "invalid_request_error" | "context_length_exceeded" => {
                ApiErrorCode::InvalidRequest
            }
            "insufficient_quota" | "billing_hard_limit_reached" => ApiErrorCode::QuotaExceeded,
            "content_policy_violation" | "content_filter" => ApiErrorCode::ContentFiltered,
            "model_not_found" => ApiErrorCode::ModelNotFound,
            _ => return None,
        };
        Some(code)
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error reported by (or on behalf of) an external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Provider hint for when to try again (e.g. `Retry-After`)
    pub retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Timeout, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::ServiceUnavailable, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
