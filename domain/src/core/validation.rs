//! Validation result value object

use serde::{Deserialize, Serialize};

/// Outcome of a validation step (Value Object)
///
/// Either fully valid (no message, no suggestions) or invalid with a
/// human-readable message and optional suggestions. The fields are private so
/// a result can never be partially valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    is_valid: bool,
    error_message: String,
    suggestions: Vec<String>,
}

impl ValidationResult {
    /// A passing result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: String::new(),
            suggestions: Vec::new(),
        }
    }

    /// A failing result with a message and suggestions
    pub fn invalid(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Validation failed".to_string();
        }
        Self {
            is_valid: false,
            error_message: message,
            suggestions,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn into_parts(self) -> (bool, String, Vec<String>) {
        (self.is_valid, self.error_message, self.suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_has_no_message() {
        let result = ValidationResult::valid();
        assert!(result.is_valid());
        assert!(result.error_message().is_empty());
        assert!(result.suggestions().is_empty());
    }

    #[test]
    fn test_invalid_never_has_empty_message() {
        let result = ValidationResult::invalid("  ", vec![]);
        assert!(!result.is_valid());
        assert!(!result.error_message().is_empty());
    }
}
