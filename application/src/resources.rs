//! Process-wide resources shared by pipeline runs.
//!
//! [`ResourceManager`] caps concurrent external calls and in-flight pipelines;
//! [`PipelineContext`] bundles it with the event logger and a cancellation
//! token and is handed to every invocation.

use crate::ports::pipeline_logger::{NoPipelineLogger, PipelineLogger};
use math_comic_domain::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_MAX_API_CALLS: usize = 4;
pub const DEFAULT_MAX_PIPELINES: usize = 2;

/// Retry hint handed to callers rejected at admission
pub const OVERLOADED_RETRY_AFTER: Duration = Duration::from_secs(5);

/// What to do when every pipeline slot is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait for a slot (cancellable)
    #[default]
    Queue,
    /// Fail immediately with an "overloaded" response
    Reject,
}

impl std::str::FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(AdmissionPolicy::Queue),
            "reject" => Ok(AdmissionPolicy::Reject),
            other => Err(format!("Unknown admission policy '{}'", other)),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Service is overloaded, retry later")]
    Overloaded,

    #[error("Cancelled while waiting for a permit")]
    Cancelled,

    #[error("Resource manager is shut down")]
    Closed,
}

impl AdmissionError {
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            AdmissionError::Overloaded | AdmissionError::Closed => ErrorResponse {
                user_message: "The comic service is busy, please retry later".to_string(),
                should_retry: true,
                retry_after: Some(OVERLOADED_RETRY_AFTER),
                resolution_steps: vec!["Wait a few seconds and try again".to_string()],
            },
            AdmissionError::Cancelled => ErrorResponse::permanent(
                "The request was cancelled",
                vec!["Start the request again if this was unintended".to_string()],
            ),
        }
    }
}

/// Semaphore-backed limits on external calls and in-flight pipelines
#[derive(Debug)]
pub struct ResourceManager {
    api_calls: Arc<Semaphore>,
    pipelines: Arc<Semaphore>,
    admission: AdmissionPolicy,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_API_CALLS, DEFAULT_MAX_PIPELINES, AdmissionPolicy::Queue)
    }
}

impl ResourceManager {
    /// Caps of zero are raised to one so the pipeline can always make progress.
    pub fn new(max_api_calls: usize, max_pipelines: usize, admission: AdmissionPolicy) -> Self {
        Self {
            api_calls: Arc::new(Semaphore::new(max_api_calls.max(1))),
            pipelines: Arc::new(Semaphore::new(max_pipelines.max(1))),
            admission,
        }
    }

    pub fn admission(&self) -> AdmissionPolicy {
        self.admission
    }

    pub fn available_api_permits(&self) -> usize {
        self.api_calls.available_permits()
    }

    pub fn available_pipeline_slots(&self) -> usize {
        self.pipelines.available_permits()
    }

    /// Permit for one external call; always waits (cancellable)
    pub async fn acquire_api_permit(
        &self,
        cancellation: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, AdmissionError> {
        Self::acquire(&self.api_calls, cancellation).await
    }

    /// Slot for one pipeline run, honoring the admission policy
    pub async fn admit_pipeline(
        &self,
        cancellation: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, AdmissionError> {
        match self.admission {
            AdmissionPolicy::Queue => Self::acquire(&self.pipelines, cancellation).await,
            AdmissionPolicy::Reject => {
                Arc::clone(&self.pipelines)
                    .try_acquire_owned()
                    .map_err(|e| match e {
                        tokio::sync::TryAcquireError::NoPermits => AdmissionError::Overloaded,
                        tokio::sync::TryAcquireError::Closed => AdmissionError::Closed,
                    })
            }
        }
    }

    async fn acquire(
        semaphore: &Arc<Semaphore>,
        cancellation: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, AdmissionError> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(AdmissionError::Cancelled),
            permit = Arc::clone(semaphore).acquire_owned() => {
                permit.map_err(|_| AdmissionError::Closed)
            }
        }
    }
}

/// Services carried through one pipeline invocation
#[derive(Clone)]
pub struct PipelineContext {
    pub resources: Arc<ResourceManager>,
    pub logger: Arc<dyn PipelineLogger>,
    pub cancellation: CancellationToken,
    /// Correlates every event of one invocation
    pub request_id: String,
}

impl PipelineContext {
    pub fn new(resources: Arc<ResourceManager>, logger: Arc<dyn PipelineLogger>) -> Self {
        Self {
            resources,
            logger,
            cancellation: CancellationToken::new(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Context for a new invocation: same services, fresh request id, and a
    /// child token so cancelling the parent cancels the run
    pub fn for_request(&self) -> Self {
        Self {
            resources: Arc::clone(&self.resources),
            logger: Arc::clone(&self.logger),
            cancellation: self.cancellation.child_token(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new(Arc::new(ResourceManager::default()), Arc::new(NoPipelineLogger))
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("resources", &self.resources)
            .field("request_id", &self.request_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reject_policy_fails_fast_when_full() {
        let manager = ResourceManager::new(4, 1, AdmissionPolicy::Reject);
        let token = CancellationToken::new();

        let first = manager.admit_pipeline(&token).await.unwrap();
        assert_eq!(
            manager.admit_pipeline(&token).await.unwrap_err(),
            AdmissionError::Overloaded
        );

        drop(first);
        assert!(manager.admit_pipeline(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_queue_policy_waits_until_cancelled() {
        let manager = ResourceManager::new(4, 1, AdmissionPolicy::Queue);
        let token = CancellationToken::new();
        let _held = manager.admit_pipeline(&token).await.unwrap();

        let waiter_token = CancellationToken::new();
        let cancel = waiter_token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        assert_eq!(
            manager.admit_pipeline(&waiter_token).await.unwrap_err(),
            AdmissionError::Cancelled
        );
    }

    #[tokio::test]
    async fn test_api_permits_are_bounded() {
        let manager = ResourceManager::new(2, 1, AdmissionPolicy::Queue);
        let token = CancellationToken::new();

        let a = manager.acquire_api_permit(&token).await.unwrap();
        let _b = manager.acquire_api_permit(&token).await.unwrap();
        assert_eq!(manager.available_api_permits(), 0);
        drop(a);
        assert_eq!(manager.available_api_permits(), 1);
    }

    #[test]
    fn test_overloaded_response_is_retryable() {
        let response = AdmissionError::Overloaded.to_error_response();
        assert!(response.should_retry);
        assert_eq!(response.retry_after, Some(OVERLOADED_RETRY_AFTER));
    }

    #[test]
    fn test_child_context_cancels_with_parent() {
        let parent = PipelineContext::default();
        let child = parent.for_request();
        assert_ne!(parent.request_id, child.request_id);

        parent.cancellation.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_admission_policy_parse() {
        assert_eq!("Queue".parse::<AdmissionPolicy>(), Ok(AdmissionPolicy::Queue));
        assert_eq!("reject".parse::<AdmissionPolicy>(), Ok(AdmissionPolicy::Reject));
        assert!("drop".parse::<AdmissionPolicy>().is_err());
    }
}
