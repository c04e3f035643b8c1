//! Shared utilities for use cases.
//!
//! Cancellation racing and timing helpers used across the pipeline stages.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Race a future against cancellation.
///
/// Returns `None` if the token fires first (or was already cancelled).
pub(crate) async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Sleep for `delay` unless cancelled; `false` if cancelled.
pub(crate) async fn sleep_cancellable(token: &CancellationToken, delay: Duration) -> bool {
    cancellable(token, tokio::time::sleep(delay)).await.is_some()
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
