//! # Schema Errors

use thiserror::Error;

/// Result type for schema-build and compile operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Configuration errors raised while building or compiling a schema.
///
/// These are programmer errors: they surface synchronously from
/// `Schema::create` or a compile entry point and never reach an error
/// reporter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid options for rule '{rule}': {reason}")]
    InvalidOptions { rule: String, reason: String },

    #[error("Rule '{rule}' cannot be used on {kind} fields")]
    IncompatibleKind { rule: String, kind: String },

    #[error("Invalid schema shape: {0}")]
    InvalidShape(String),

    #[error("Schema has async rules and must be validated asynchronously")]
    AsyncSchema,

    #[error("Internal error: {0}")]
    Internal(String),
}
