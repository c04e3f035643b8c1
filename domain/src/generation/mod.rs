//! Content generation domain
//!
//! Provider errors, their classification into [`ErrorResponse`], and the
//! [`RetryPolicy`] that decides when to try again.

mod api_error;
mod classification;
mod retry;

pub use api_error::{ApiError, ApiErrorCode};
pub use classification::ErrorResponse;
pub use retry::RetryPolicy;
