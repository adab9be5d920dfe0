//! # Validation Rules
//!
//! The rule catalog and the registry that resolves rule names to handlers.
//! Every rule lives behind the same two-phase contract: `compile` runs once
//! per schema and turns raw options into a typed, reusable `ParsedRule`;
//! `validate` runs per input against the field's mutable cell.
//!
//! # Design Principles
//!
//! - Compile once, validate many: all option parsing happens up front
//! - Rules never walk the tree, they see exactly one field cell
//! - Async is opt-in per rule; sync rules pay nothing for it

mod constraints;
mod presence;
mod types;

pub use constraints::{After, GreaterThan, Matches, MaxLength, MinLength, Trim};
pub use presence::{Nullable, Required};
pub use types::{ArrayShape, BooleanType, DateType, NumberType, ObjectShape, OneOf, StringType};

pub use async_trait::async_trait;

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::reporter::{Halt, StepResult};
use crate::runtime::{ExecutionContext, FieldCell};
use crate::schema::{NodeKind, ParsedRule, SchemaError, SchemaResult};

/// What a rule learns about its host node while compiling.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo<'a> {
    pub kind: NodeKind,
    pub name: &'a str,
}

/// A rule reference inside a schema definition: the registered name plus
/// raw, unvalidated options. Turned into a `ParsedRule` at schema build.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pub name: String,
    pub options: Vec<Value>,
}

impl RuleSpec {
    pub fn new(name: &str, options: Vec<Value>) -> Self {
        RuleSpec {
            name: name.to_string(),
            options,
        }
    }

    /// A rule that takes no options.
    pub fn bare(name: &str) -> Self {
        Self::new(name, Vec::new())
    }
}

/// Minimum length constraint for strings and arrays.
pub fn min_length(limit: u64) -> RuleSpec {
    RuleSpec::new("min_length", vec![Value::from(limit)])
}

/// Maximum length constraint for strings and arrays.
pub fn max_length(limit: u64) -> RuleSpec {
    RuleSpec::new("max_length", vec![Value::from(limit)])
}

/// Exclusive numeric lower bound.
pub fn greater_than(bound: f64) -> RuleSpec {
    RuleSpec::new("greater_than", vec![Value::from(bound)])
}

/// Regular expression constraint for strings. Anchor the pattern yourself
/// if a full match is required.
pub fn matches(pattern: &str) -> RuleSpec {
    RuleSpec::new("matches", vec![Value::from(pattern)])
}

/// Whitespace trim sanitizer. Never reports a failure.
pub fn trim() -> RuleSpec {
    RuleSpec::bare("trim")
}

/// Date must fall after a fixed anchor date (yyyy-mm-dd).
pub fn after(anchor: &str) -> RuleSpec {
    RuleSpec::new("after", vec![Value::from(anchor)])
}

/// Date must fall after an anchor resolved from the caller's refs at
/// validate time.
pub fn after_ref(key: &str) -> RuleSpec {
    RuleSpec::new("after", vec![serde_json::json!({ "$ref": key })])
}

/// The contract every rule implements.
///
/// `compile` is the once-per-schema phase: reject bad options here so the
/// hot path never re-parses them. `validate` is the per-input phase. Rules
/// that perform IO override `validate_async` and mark their parsed form
/// async; everything else runs through the sync path untouched.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Registered name, as referenced from schema definitions.
    fn name(&self) -> &'static str;

    /// Validate raw options against the host node and produce the reusable
    /// parsed form.
    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule>;

    /// Check (and possibly coerce) the field cell.
    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult;

    /// Async variant, used when the parsed rule is marked async. Defaults
    /// to the sync body.
    async fn validate_async(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        self.validate(cell, rule, tip, ctx)
    }
}

/// Reject stray options for rules that take none.
pub(crate) fn no_options(name: &str, options: &[Value]) -> SchemaResult<()> {
    if options.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::InvalidOptions {
            rule: name.to_string(),
            reason: "expected no options".to_string(),
        })
    }
}

/// Downcast a parsed rule's options back to their concrete type. A miss
/// means the registry handed validate a rule compiled elsewhere; that is a
/// fault, not a validation failure.
pub fn expect_options<'r, T: Any>(
    rule: &'r ParsedRule,
    ctx: &ExecutionContext<'_>,
) -> Result<&'r T, Halt> {
    rule.options::<T>()
        .ok_or_else(|| ctx.fault(rule, "compiled options have an unexpected type"))
}

/// Thread-safe map from rule name to handler.
///
/// Schemas hold a registry reference for compiling; execution resolves
/// handlers through the same registry, so custom rules registered after
/// schema build are still found at validate time.
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, Arc<dyn Rule>>>,
}

impl RuleRegistry {
    /// An empty registry with no rules at all.
    pub fn new() -> Self {
        RuleRegistry {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// A registry preloaded with the standard catalog.
    pub fn standard() -> Self {
        let catalog: [Arc<dyn Rule>; 15] = [
            Arc::new(Required),
            Arc::new(Nullable),
            Arc::new(StringType),
            Arc::new(NumberType),
            Arc::new(BooleanType),
            Arc::new(DateType),
            Arc::new(ObjectShape),
            Arc::new(ArrayShape),
            Arc::new(OneOf),
            Arc::new(MinLength),
            Arc::new(MaxLength),
            Arc::new(GreaterThan),
            Arc::new(Matches),
            Arc::new(Trim),
            Arc::new(After),
        ];
        let mut rules = HashMap::new();
        for rule in catalog {
            rules.insert(rule.name().to_string(), rule);
        }
        RuleRegistry {
            rules: RwLock::new(rules),
        }
    }

    /// Register a handler under its own name, replacing any previous one.
    pub fn register(&self, rule: Arc<dyn Rule>) -> SchemaResult<()> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| SchemaError::Internal("Lock poisoned".into()))?;
        rules.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Resolve a rule name to its handler.
    pub fn get(&self, name: &str) -> SchemaResult<Arc<dyn Rule>> {
        let rules = self
            .rules
            .read()
            .map_err(|_| SchemaError::Internal("Lock poisoned".into()))?;
        rules
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules
            .read()
            .map(|rules| rules.contains_key(name))
            .unwrap_or(false)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
