//! Port for structured pipeline event logging.
//!
//! Defines the [`PipelineLogger`] trait for recording pipeline events
//! (validation outcomes, provider requests and errors, stage durations, the
//! final outcome) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable event stream (JSONL).

use chrono::{DateTime, Utc};
use math_comic_domain::Stage;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known event fields plus an open `extra` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl EventFields {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Default::default()
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A structured pipeline event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEvent {
    /// Event type identifier (e.g., "api_request", "stage_complete").
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: EventFields,
}

impl PipelineEvent {
    /// Create a new event with the current UTC timestamp.
    pub fn new(event_type: &'static str, fields: EventFields) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            fields,
        }
    }
}

/// Port for logging pipeline events.
///
/// The `log` method is synchronous, non-fallible and must not block: slow
/// sinks buffer or drop rather than stall the pipeline.
pub trait PipelineLogger: Send + Sync {
    /// Record a pipeline event.
    fn log(&self, event: PipelineEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoPipelineLogger;

impl PipelineLogger for NoPipelineLogger {
    fn log(&self, _event: PipelineEvent) {}
}
