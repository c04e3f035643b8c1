//! Progress notification port
//!
//! Defines the interface for reporting progress during comic generation.

use math_comic_domain::{ErrorResponse, Stage};
use std::time::Duration;

/// Callback for progress updates during a pipeline run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait PipelineProgress: Send + Sync {
    /// Called when a stage starts
    fn on_stage_start(&self, stage: &Stage);

    /// Called when a stage finishes
    fn on_stage_complete(&self, stage: &Stage, success: bool);

    /// Called before the pipeline sleeps ahead of another content attempt
    fn on_retry(&self, _attempt: u32, _delay: Duration, _reason: &ErrorResponse) {}

    /// Called when a panel image has been rendered and stored
    fn on_panel_complete(&self, _panel_number: usize, _total: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_stage_start(&self, _stage: &Stage) {}
    fn on_stage_complete(&self, _stage: &Stage, _success: bool) {}
}
