//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — programming-contract errors
//! - [`validation::ValidationResult`] — the result every validation gate returns
//! - [`string`] — UTF-8 safe string helpers

pub mod error;
pub mod string;
pub mod validation;
