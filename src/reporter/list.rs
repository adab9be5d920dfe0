//! # List Reporter

use serde_json::{Map, Value};

use crate::messages::Messages;

use super::{ErrorReporter, Halt, Report, StepResult, ValidationError};

#[derive(Debug)]
struct Entry {
    field: String,
    rule: String,
    message: String,
    args: Option<Value>,
}

/// Default reporter: one entry per failure, in report order.
///
/// Aggregates to a JSON array of `{ field, rule, message, args? }` objects.
#[derive(Debug, Default)]
pub struct ListReporter {
    messages: Messages,
    bail: bool,
    entries: Vec<Entry>,
}

impl ListReporter {
    pub fn new(messages: Messages, bail: bool) -> Self {
        ListReporter {
            messages,
            bail,
            entries: Vec::new(),
        }
    }
}

impl ErrorReporter for ListReporter {
    fn report(&mut self, report: Report<'_>) -> StepResult {
        let message = self
            .messages
            .resolve(report.pointer, report.wildcard_pointer, report.rule)
            .unwrap_or(report.message)
            .to_string();
        self.entries.push(Entry {
            field: report.pointer.to_string(),
            rule: report.rule.to_string(),
            message,
            args: report.args,
        });
        if self.bail {
            return Err(Halt::Bail);
        }
        Ok(())
    }

    fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    fn to_error(&mut self) -> ValidationError {
        let entries: Vec<Value> = self
            .entries
            .drain(..)
            .map(|entry| {
                let mut fields = Map::new();
                fields.insert("field".to_string(), Value::String(entry.field));
                fields.insert("rule".to_string(), Value::String(entry.rule));
                fields.insert("message".to_string(), Value::String(entry.message));
                if let Some(args) = entry.args {
                    fields.insert("args".to_string(), args);
                }
                Value::Object(fields)
            })
            .collect();
        ValidationError {
            message: "validation failed".to_string(),
            errors: Value::Array(entries),
        }
    }
}
