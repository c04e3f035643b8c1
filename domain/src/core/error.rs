//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are programming-contract violations. User-correctable problems are
/// reported through [`ValidationResult`](super::validation::ValidationResult)
/// instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A concept was requested for text that did not pass classification
    #[error("Input is not mathematical content: {0}")]
    NotMathematical(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let error = DomainError::ContractViolation("4 panels but 3 images".to_string());
        assert_eq!(error.to_string(), "Contract violation: 4 panels but 3 images");
    }
}
