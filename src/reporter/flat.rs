//! # Flat Reporter

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::messages::Messages;

use super::{ErrorReporter, Halt, Report, StepResult, ValidationError};

/// Groups failure messages per field pointer.
///
/// Aggregates to a JSON object of `{ "users.0.name": ["...", ...] }`; within
/// a field, messages keep their report order.
#[derive(Debug, Default)]
pub struct FlatReporter {
    messages: Messages,
    bail: bool,
    failures: IndexMap<String, Vec<String>>,
}

impl FlatReporter {
    pub fn new(messages: Messages, bail: bool) -> Self {
        FlatReporter {
            messages,
            bail,
            failures: IndexMap::new(),
        }
    }
}

impl ErrorReporter for FlatReporter {
    fn report(&mut self, report: Report<'_>) -> StepResult {
        let message = self
            .messages
            .resolve(report.pointer, report.wildcard_pointer, report.rule)
            .unwrap_or(report.message)
            .to_string();
        self.failures
            .entry(report.pointer.to_string())
            .or_default()
            .push(message);
        if self.bail {
            return Err(Halt::Bail);
        }
        Ok(())
    }

    fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    fn to_error(&mut self) -> ValidationError {
        let mut fields = Map::new();
        for (pointer, messages) in self.failures.drain(..) {
            let messages = messages.into_iter().map(Value::String).collect();
            fields.insert(pointer, Value::Array(messages));
        }
        ValidationError {
            message: "validation failed".to_string(),
            errors: Value::Object(fields),
        }
    }
}
