//! # Error Reporting
//!
//! A reporter accumulates failures during one validation call and decides
//! bail-vs-collect. The compiled procedure checks `has_errors` once at the
//! end and surfaces `to_error`'s aggregated value; in bail mode the first
//! report stops the run instead.

mod flat;
mod list;

pub use flat::FlatReporter;
pub use list::ListReporter;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One failure, as handed to the reporter.
#[derive(Debug)]
pub struct Report<'a> {
    /// Concrete pointer, e.g. `users.0.username`.
    pub pointer: &'a str,
    /// Wildcard pointer, e.g. `users.*.username`, when inside an array.
    pub wildcard_pointer: Option<&'a str>,
    /// Name of the reporting rule.
    pub rule: &'a str,
    /// The rule's default message, used unless an override matches.
    pub message: &'a str,
    /// Rule-specific details (bounds, choices, ...).
    pub args: Option<Value>,
}

/// Why a compiled step stopped early.
#[derive(Debug)]
pub enum Halt {
    /// A bail-mode reporter recorded the first failure.
    Bail,
    /// A rule failed for reasons that are not a validation verdict.
    Fault(RuleFault),
}

/// Outcome of one rule invocation or compiled step.
pub type StepResult = Result<(), Halt>;

/// Unexpected failure inside a rule: a missing ref, an options type
/// mismatch, a rule unregistered since compile. Propagates out of the
/// validation call unconverted; it indicates a bug, not bad input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Rule '{rule}' faulted at '{pointer}': {reason}")]
pub struct RuleFault {
    pub rule: String,
    pub pointer: String,
    pub reason: String,
}

impl RuleFault {
    pub fn new(rule: &str, pointer: &str, reason: impl Into<String>) -> Self {
        RuleFault {
            rule: rule.to_string(),
            pointer: pointer.to_string(),
            reason: reason.into(),
        }
    }
}

/// Aggregated validation failure. The `errors` payload shape is entirely
/// determined by the reporter that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: Value,
}

/// Collects failures during one validation call.
///
/// `report` may refuse further work by returning `Halt::Bail`; the compiled
/// procedure treats that as an instruction to stop and aggregate what was
/// recorded so far.
pub trait ErrorReporter: Send {
    fn report(&mut self, report: Report<'_>) -> StepResult;
    fn has_errors(&self) -> bool;
    fn to_error(&mut self) -> ValidationError;
}
