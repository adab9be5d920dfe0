//! # Error Surface
//!
//! The single error type validation entry points return. Configuration
//! problems, aggregated validation verdicts and rule faults stay distinct
//! types underneath; this union only forwards them.

use thiserror::Error;

use crate::reporter::{RuleFault, ValidationError};
use crate::schema::SchemaError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidateError {
    /// The schema or the call configuration is wrong.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The input failed validation; the payload shape is the reporter's.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A rule could not do its job (missing ref, stale registry).
    #[error(transparent)]
    Rule(#[from] RuleFault),
}

impl ValidateError {
    /// The aggregated verdict, when this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ValidateError::Validation(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_passes_through() {
        let error = ValidateError::from(SchemaError::UnknownRule("exists".into()));
        assert_eq!(error.to_string(), "Unknown rule: exists");

        let error = ValidateError::from(ValidationError {
            message: "validation failed".into(),
            errors: json!([]),
        });
        assert_eq!(error.to_string(), "validation failed");
        assert!(error.validation().is_some());
    }
}
