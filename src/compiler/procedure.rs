//! # Compiled Procedure
//!
//! The reusable product of compilation: root steps in declaration order,
//! the async flag, and the diagnostic listing. One procedure serves any
//! number of concurrent validation calls; all per-call state lives in the
//! execution context built here.

use serde_json::{Map, Value};

use crate::errors::ValidateError;
use crate::reporter::{ErrorReporter, Halt};
use crate::rules::RuleRegistry;
use crate::runtime::{ExecutionContext, OutSlot, Refs, RuntimeSupport};
use crate::schema::SchemaError;

use super::Step;

#[derive(Debug)]
pub struct CompiledProcedure {
    steps: Vec<(String, Step)>,
    is_async: bool,
    listing: String,
}

impl CompiledProcedure {
    pub(super) fn new(steps: Vec<(String, Step)>, is_async: bool, listing: String) -> Self {
        CompiledProcedure {
            steps,
            is_async,
            listing,
        }
    }

    /// True when any rule in the schema suspends. Async procedures refuse
    /// the sync entry point.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Human-readable record of the emitted steps.
    pub fn listing(&self) -> &str {
        &self.listing
    }

    /// Validate one input. Returns the sanitized output object on success;
    /// a non-object root behaves as if every field were missing.
    pub async fn execute(
        &self,
        data: &Value,
        registry: &RuleRegistry,
        reporter: &mut dyn ErrorReporter,
        support: RuntimeSupport,
        refs: &Refs,
    ) -> Result<Value, ValidateError> {
        let mut output = Map::new();
        {
            let mut ctx = ExecutionContext::new(data, registry, &mut *reporter, support, refs);
            for (name, step) in &self.steps {
                let slot = OutSlot::Field {
                    out: &mut output,
                    key: name,
                };
                match step.run(data, slot, &mut ctx).await {
                    Ok(()) => {}
                    Err(Halt::Bail) => break,
                    Err(Halt::Fault(fault)) => return Err(ValidateError::Rule(fault)),
                }
            }
        }
        if reporter.has_errors() {
            return Err(ValidateError::Validation(reporter.to_error()));
        }
        Ok(Value::Object(output))
    }

    /// Synchronous execution for schemas with no async rules.
    pub fn execute_sync(
        &self,
        data: &Value,
        registry: &RuleRegistry,
        reporter: &mut dyn ErrorReporter,
        support: RuntimeSupport,
        refs: &Refs,
    ) -> Result<Value, ValidateError> {
        if self.is_async {
            return Err(ValidateError::Schema(SchemaError::AsyncSchema));
        }
        let mut output = Map::new();
        {
            let mut ctx = ExecutionContext::new(data, registry, &mut *reporter, support, refs);
            for (name, step) in &self.steps {
                let slot = OutSlot::Field {
                    out: &mut output,
                    key: name,
                };
                match step.run_sync(data, slot, &mut ctx) {
                    Ok(()) => {}
                    Err(Halt::Bail) => break,
                    Err(Halt::Fault(fault)) => return Err(ValidateError::Rule(fault)),
                }
            }
        }
        if reporter.has_errors() {
            return Err(ValidateError::Validation(reporter.to_error()));
        }
        Ok(Value::Object(output))
    }
}
