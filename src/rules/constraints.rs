//! # Constraint Rules
//!
//! Bounds, patterns and sanitizers layered on top of the type rules. Each
//! one validates its options at schema build, including subtype
//! compatibility, so the validate phase only ever sees well-formed state.
//! A value of the wrong JSON type is skipped silently here; the type rule
//! ahead of it already reported.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Value};

use crate::reporter::StepResult;
use crate::runtime::{ExecutionContext, FieldCell};
use crate::schema::{NodeKind, ParsedRule, SchemaError, SchemaResult, Subtype};

use super::{expect_options, no_options, NodeInfo, Rule};

fn require_kind(rule: &str, node: NodeInfo<'_>, allowed: &[NodeKind]) -> SchemaResult<()> {
    if allowed.contains(&node.kind) {
        Ok(())
    } else {
        Err(SchemaError::IncompatibleKind {
            rule: rule.to_string(),
            kind: node.kind.label().to_string(),
        })
    }
}

/// Compiled limit for the length rules.
#[derive(Debug)]
pub struct LengthOptions {
    pub limit: u64,
}

fn compile_length(
    rule: &dyn Rule,
    node: NodeInfo<'_>,
    options: &[Value],
) -> SchemaResult<ParsedRule> {
    require_kind(
        rule.name(),
        node,
        &[NodeKind::Literal(Subtype::String), NodeKind::Array],
    )?;
    let limit = match options {
        [limit] => limit.as_u64(),
        _ => None,
    }
    .ok_or_else(|| SchemaError::InvalidOptions {
        rule: rule.name().to_string(),
        reason: "expected one non-negative integer".to_string(),
    })?;
    Ok(ParsedRule::new(rule.name(), LengthOptions { limit }))
}

fn measured(cell: &FieldCell<'_>) -> Option<u64> {
    match cell.value() {
        Some(Value::String(text)) => Some(text.chars().count() as u64),
        Some(Value::Array(items)) => Some(items.len() as u64),
        _ => None,
    }
}

/// Minimum length for strings (characters) and arrays (elements).
pub struct MinLength;

impl Rule for MinLength {
    fn name(&self) -> &'static str {
        "min_length"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        compile_length(self, node, options)
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let options = expect_options::<LengthOptions>(rule, ctx)?;
        match measured(cell) {
            Some(length) if length < options.limit => {
                let args = json!({ "min": options.limit });
                ctx.fail(rule, "min_length validation failed", Some(args))
            }
            _ => Ok(()),
        }
    }
}

/// Maximum length for strings (characters) and arrays (elements).
pub struct MaxLength;

impl Rule for MaxLength {
    fn name(&self) -> &'static str {
        "max_length"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        compile_length(self, node, options)
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let options = expect_options::<LengthOptions>(rule, ctx)?;
        match measured(cell) {
            Some(length) if length > options.limit => {
                let args = json!({ "max": options.limit });
                ctx.fail(rule, "max_length validation failed", Some(args))
            }
            _ => Ok(()),
        }
    }
}

/// Compiled bound for `greater_than`.
#[derive(Debug)]
pub struct BoundOptions {
    pub bound: f64,
}

/// Exclusive numeric lower bound. Runs after the number rule, so coerced
/// strings are already numbers by the time it looks.
pub struct GreaterThan;

impl Rule for GreaterThan {
    fn name(&self) -> &'static str {
        "greater_than"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        require_kind(self.name(), node, &[NodeKind::Literal(Subtype::Number)])?;
        let bound = match options {
            [bound] => bound.as_f64(),
            _ => None,
        }
        .ok_or_else(|| SchemaError::InvalidOptions {
            rule: self.name().to_string(),
            reason: "expected one number".to_string(),
        })?;
        Ok(ParsedRule::new(self.name(), BoundOptions { bound }))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let options = expect_options::<BoundOptions>(rule, ctx)?;
        let number = match cell.value() {
            Some(Value::Number(number)) => number.as_f64(),
            _ => None,
        };
        match number {
            Some(number) if number <= options.bound => {
                let args = json!({ "gt": options.bound });
                ctx.fail(rule, "greater_than validation failed", Some(args))
            }
            _ => Ok(()),
        }
    }
}

/// Compiled pattern for `matches`.
#[derive(Debug)]
pub struct PatternOptions {
    pub pattern: Regex,
}

/// Regular expression constraint for strings. The pattern is compiled once
/// at schema build; an invalid pattern is a configuration error, never a
/// validation failure.
pub struct Matches;

impl Rule for Matches {
    fn name(&self) -> &'static str {
        "matches"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        require_kind(self.name(), node, &[NodeKind::Literal(Subtype::String)])?;
        let source = match options {
            [Value::String(source)] => source.as_str(),
            _ => {
                return Err(SchemaError::InvalidOptions {
                    rule: self.name().to_string(),
                    reason: "expected one pattern string".to_string(),
                })
            }
        };
        let pattern = Regex::new(source).map_err(|error| SchemaError::InvalidOptions {
            rule: self.name().to_string(),
            reason: format!("invalid pattern: {}", error),
        })?;
        Ok(ParsedRule::new(self.name(), PatternOptions { pattern }))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let options = expect_options::<PatternOptions>(rule, ctx)?;
        let matched = match cell.value() {
            Some(Value::String(text)) => options.pattern.is_match(text),
            _ => return Ok(()),
        };
        if matched {
            Ok(())
        } else {
            ctx.fail(rule, "matches validation failed", None)
        }
    }
}

/// Whitespace trim sanitizer for strings. Mutates, never reports.
pub struct Trim;

impl Rule for Trim {
    fn name(&self) -> &'static str {
        "trim"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        require_kind(
            self.name(),
            node,
            &[
                NodeKind::Literal(Subtype::String),
                NodeKind::Literal(Subtype::Number),
            ],
        )?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        _rule: &ParsedRule,
        _tip: &Value,
        _ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let trimmed = match cell.value() {
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.len() == text.len() {
                    None
                } else {
                    Some(Value::from(trimmed))
                }
            }
            _ => None,
        };
        if let Some(value) = trimmed {
            cell.mutate(value);
        }
        Ok(())
    }
}

/// Compiled anchor for `after`: fixed at build time or resolved from the
/// per-call refs.
#[derive(Debug, Clone, PartialEq)]
pub enum AfterAnchor {
    Literal(NaiveDate),
    Ref(String),
}

/// Date must fall strictly after the anchor. With a ref anchor, the same
/// compiled procedure can enforce a different boundary on every call; a
/// missing or malformed ref is a fault, not a validation verdict.
pub struct After;

impl Rule for After {
    fn name(&self) -> &'static str {
        "after"
    }

    fn compile(&self, node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        require_kind(self.name(), node, &[NodeKind::Literal(Subtype::Date)])?;
        let invalid = || SchemaError::InvalidOptions {
            rule: self.name().to_string(),
            reason: "expected a yyyy-mm-dd string or a ref marker".to_string(),
        };
        let anchor = match options {
            [Value::String(text)] => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())?;
                AfterAnchor::Literal(date)
            }
            [Value::Object(marker)] if marker.len() == 1 => match marker.get("$ref") {
                Some(Value::String(key)) => AfterAnchor::Ref(key.clone()),
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };
        Ok(ParsedRule::new(self.name(), anchor))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let anchor = expect_options::<AfterAnchor>(rule, ctx)?;
        let boundary = match anchor {
            AfterAnchor::Literal(date) => *date,
            AfterAnchor::Ref(key) => {
                let value = ctx
                    .refs()
                    .get(key)
                    .ok_or_else(|| ctx.fault(rule, format!("ref '{}' is not provided", key)))?;
                let text = value
                    .as_str()
                    .ok_or_else(|| ctx.fault(rule, format!("ref '{}' is not a string", key)))?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
                    ctx.fault(rule, format!("ref '{}' is not a yyyy-mm-dd date", key))
                })?
            }
        };
        let subject = match cell.value() {
            Some(Value::String(text)) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            _ => None,
        };
        match subject {
            Some(date) if date <= boundary => {
                let args = json!({ "after": boundary.format("%Y-%m-%d").to_string() });
                ctx.fail(rule, "after validation failed", Some(args))
            }
            _ => Ok(()),
        }
    }
}
