//! Provider error classification
//!
//! Maps every [`ApiErrorCode`] to the user-facing [`ErrorResponse`]. Callers
//! decide whether to offer "try again" purely from `should_retry`, so this
//! table is the contract between the pipeline and everything above it.
//!
//! | code                | retry | delay                      |
//! |---------------------|-------|----------------------------|
//! | RateLimited         | yes   | provider hint, else backoff|
//! | Timeout             | yes   | backoff                    |
//! | ServiceUnavailable  | yes   | provider hint, else backoff|
//! | ServerError         | yes   | backoff                    |
//! | InvalidResponse     | yes   | backoff                    |
//! | Unauthorized        | no    |                            |
//! | InvalidRequest      | no    |                            |
//! | QuotaExceeded       | no    |                            |
//! | ContentFiltered     | no    |                            |
//! | ModelNotFound       | no    |                            |
//! | Unknown             | no    |                            |

use super::api_error::{ApiError, ApiErrorCode};
use super::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The only externally visible failure shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub user_message: String,
    pub should_retry: bool,
    #[serde(rename = "retry_after_ms", with = "duration_millis", default)]
    pub retry_after: Option<Duration>,
    pub resolution_steps: Vec<String>,
}

impl ErrorResponse {
    /// A response the caller cannot fix by retrying
    pub fn permanent(user_message: impl Into<String>, resolution_steps: Vec<String>) -> Self {
        Self {
            user_message: user_message.into(),
            should_retry: false,
            retry_after: None,
            resolution_steps,
        }
    }

    /// A response the caller may retry after `retry_after`
    pub fn transient(user_message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            user_message: user_message.into(),
            should_retry: true,
            retry_after,
            resolution_steps: vec!["Wait a moment and try again".to_string()],
        }
    }

    /// Classify a provider error after the given attempt (1-based)
    pub fn from_api_error(error: &ApiError, attempt: u32, policy: &RetryPolicy) -> Self {
        let hinted = || policy.delay_for(attempt, error.retry_after);
        let backoff = || policy.backoff(attempt);

        match &error.code {
            ApiErrorCode::RateLimited => Self::transient(
                "The comic service is receiving too many requests right now",
                Some(hinted()),
            ),
            ApiErrorCode::Timeout => Self::transient(
                "The comic service took too long to respond",
                Some(backoff()),
            ),
            ApiErrorCode::ServiceUnavailable => Self::transient(
                "The comic service is temporarily unavailable",
                Some(hinted()),
            ),
            ApiErrorCode::ServerError => Self::transient(
                "The comic service ran into an internal error",
                Some(backoff()),
            ),
            ApiErrorCode::InvalidResponse => Self::transient(
                "The comic service returned an incomplete story",
                Some(backoff()),
            ),
            ApiErrorCode::Unauthorized => Self::permanent(
                "The comic service rejected our credentials",
                vec![
                    "Check that the API key environment variable is set".to_string(),
                    "Verify the key is valid and has access to the configured model".to_string(),
                ],
            ),
            ApiErrorCode::InvalidRequest => Self::permanent(
                "The comic request was not accepted by the service",
                vec![
                    "Try a shorter or simpler topic".to_string(),
                    "Check the provider model and endpoint configuration".to_string(),
                ],
            ),
            ApiErrorCode::QuotaExceeded => Self::permanent(
                "The usage quota for the comic service is exhausted",
                vec![
                    "Check the billing and quota settings of the provider account".to_string(),
                ],
            ),
            ApiErrorCode::ContentFiltered => Self::permanent(
                "The request was blocked by the service's content policy",
                vec!["Rephrase the topic using neutral, classroom-appropriate wording".to_string()],
            ),
            ApiErrorCode::ModelNotFound => Self::permanent(
                "The configured model is not available",
                vec!["Check the model name in the [provider] configuration".to_string()],
            ),
            ApiErrorCode::Unknown(code) => Self::permanent(
                format!("The comic service failed unexpectedly ({})", code),
                vec![
                    "Try again later".to_string(),
                    "If the problem persists, check the event log for details".to_string(),
                ],
            ),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
