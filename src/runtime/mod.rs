//! # Runtime Support
//!
//! Execution state threaded through a compiled procedure. One validation
//! call owns one `ExecutionContext`: the root input, the registry handle,
//! the reporter, the per-call refs, and the live array-index stack. Each
//! field in flight gets a `FieldCell`, the single mutable binding rules
//! coerce through.
//!
//! # Design Principles
//!
//! - One context per call, passed by unique reference
//! - One cell per field in flight, never aliased across fields
//! - Existence is re-derived on every mutation

pub mod cache;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::reporter::{ErrorReporter, Halt, Report, RuleFault, StepResult};
use crate::rules::{Rule, RuleRegistry};
use crate::schema::ParsedRule;

/// Caller-supplied values resolved by rules at validate time, not compile
/// time. Read-only for the duration of one call.
pub type Refs = HashMap<String, Value>;

/// Existence strictness for presence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Existence {
    /// Missing and null do not exist.
    #[default]
    Loose,
    /// Additionally treats the empty string as non-existent.
    Strict,
}

/// The shared helpers every compiled procedure evaluates fields with.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeSupport {
    pub existence: Existence,
}

impl RuntimeSupport {
    pub fn strict() -> Self {
        RuntimeSupport {
            existence: Existence::Strict,
        }
    }

    /// Presence test: undefined and null never exist; strict mode also
    /// rejects the empty string.
    pub fn exists(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) if self.existence == Existence::Strict => !text.is_empty(),
            Some(_) => true,
        }
    }

    /// True for non-null, non-array objects.
    pub fn is_object_shaped(&self, value: &Value) -> bool {
        value.is_object()
    }
}

/// The mutable binding for one field in flight.
///
/// Starts as a borrow of the input; the first mutation switches it to an
/// owned value. The exists flag is re-derived on every mutation so presence
/// stays responsive to coercion.
#[derive(Debug)]
pub struct FieldCell<'v> {
    value: Option<Cow<'v, Value>>,
    exists: bool,
    support: RuntimeSupport,
}

impl<'v> FieldCell<'v> {
    pub fn new(value: Option<&'v Value>, support: RuntimeSupport) -> Self {
        let exists = support.exists(value);
        FieldCell {
            value: value.map(Cow::Borrowed),
            exists,
            support,
        }
    }

    /// Presence under the call's existence mode.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Current value, reflecting any mutations so far.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    /// Field present with an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self.value(), Some(Value::Null))
    }

    /// Field absent from its container.
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }

    /// Replace the value; later rules and output assembly see the result.
    pub fn mutate(&mut self, next: Value) {
        self.exists = self.support.exists(Some(&next));
        self.value = Some(Cow::Owned(next));
    }

    pub(crate) fn into_value(self) -> Option<Value> {
        self.value.map(Cow::into_owned)
    }
}

/// Where a compiled step writes its validated value.
#[derive(Debug)]
pub(crate) enum OutSlot<'o> {
    /// Keyed slot in an output object.
    Field {
        out: &'o mut serde_json::Map<String, Value>,
        key: &'o str,
    },
    /// Element slot in an output array.
    Element(&'o mut Value),
}

impl OutSlot<'_> {
    pub(crate) fn assign(self, value: Value) {
        match self {
            OutSlot::Field { out, key } => {
                out.insert(key.to_string(), value);
            }
            OutSlot::Element(slot) => *slot = value,
        }
    }
}

/// How a compiled step locates its field inside the tip container.
#[derive(Debug, Clone)]
pub(crate) enum Access {
    Key(String),
    /// Array element addressed by the top of the index stack.
    Element,
}

/// Per-call execution state, threaded by unique reference through every
/// compiled step and into every rule invocation.
pub struct ExecutionContext<'c> {
    root: &'c Value,
    registry: &'c RuleRegistry,
    reporter: &'c mut dyn ErrorReporter,
    support: RuntimeSupport,
    refs: &'c Refs,
    indices: Vec<usize>,
    pointer: String,
    field: String,
    wildcard: Option<String>,
}

impl<'c> ExecutionContext<'c> {
    pub(crate) fn new(
        root: &'c Value,
        registry: &'c RuleRegistry,
        reporter: &'c mut dyn ErrorReporter,
        support: RuntimeSupport,
        refs: &'c Refs,
    ) -> Self {
        ExecutionContext {
            root,
            registry,
            reporter,
            support,
            refs,
            indices: Vec::new(),
            pointer: String::new(),
            field: String::new(),
            wildcard: None,
        }
    }

    /// The whole input payload.
    pub fn root(&self) -> &Value {
        self.root
    }

    /// Per-call refs map.
    pub fn refs(&self) -> &Refs {
        self.refs
    }

    pub fn support(&self) -> RuntimeSupport {
        self.support
    }

    /// Concrete pointer of the field currently under validation.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Name (or index) of the field currently under validation.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Wildcard pointer, when the current field sits inside an array.
    pub fn wildcard_pointer(&self) -> Option<&str> {
        self.wildcard.as_deref()
    }

    /// Report a failure for the current field. Returns the bail signal when
    /// the reporter stops the run.
    pub fn fail(&mut self, rule: &ParsedRule, message: &str, args: Option<Value>) -> StepResult {
        self.reporter.report(Report {
            pointer: &self.pointer,
            wildcard_pointer: self.wildcard.as_deref(),
            rule: &rule.name,
            message,
            args,
        })
    }

    /// Build a fault for the current field (bad ref, options mismatch, ...).
    pub fn fault(&self, rule: &ParsedRule, reason: impl Into<String>) -> Halt {
        Halt::Fault(RuleFault::new(&rule.name, &self.pointer, reason))
    }

    pub(crate) fn handler(&self, rule: &ParsedRule) -> Result<Arc<dyn Rule>, Halt> {
        self.registry.get(&rule.name).map_err(|_| {
            Halt::Fault(RuleFault::new(
                &rule.name,
                &self.pointer,
                "rule is no longer registered",
            ))
        })
    }

    pub(crate) fn read<'v>(&self, tip: &'v Value, access: &Access) -> Option<&'v Value> {
        match access {
            Access::Key(key) => tip.get(key.as_str()),
            Access::Element => self.indices.last().and_then(|index| tip.get(*index)),
        }
    }

    pub(crate) fn enter_field(&mut self, pointer: String, field: String, wildcard: Option<String>) {
        self.pointer = pointer;
        self.field = field;
        self.wildcard = wildcard;
    }

    pub(crate) fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.indices.push(index);
    }

    pub(crate) fn pop_index(&mut self) {
        self.indices.pop();
    }
}
