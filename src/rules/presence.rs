//! # Presence Rules
//!
//! The two rules that run even when a field is absent. The builder inserts
//! exactly one of them ahead of everything else unless the field is
//! optional.

use serde_json::Value;

use crate::reporter::StepResult;
use crate::runtime::{ExecutionContext, FieldCell};
use crate::schema::{ParsedRule, SchemaResult};

use super::{no_options, NodeInfo, Rule};

/// Field must exist: not missing, not null, and under strict existence not
/// an empty string either.
pub struct Required;

impl Rule for Required {
    fn name(&self) -> &'static str {
        "required"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()).with_allow_undefineds())
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        if cell.exists() {
            Ok(())
        } else {
            ctx.fail(rule, "required validation failed", None)
        }
    }
}

/// Field must be defined but may hold an explicit null. A null value stops
/// the rest of the chain through the ordinary existence gate and surfaces
/// as `null` in the output.
pub struct Nullable;

impl Rule for Nullable {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()).with_allow_undefineds())
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        if cell.is_missing() {
            ctx.fail(rule, "nullable validation failed", None)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{NodeKind, SchemaError, Subtype};

    use super::*;

    #[test]
    fn test_presence_rules_take_no_options() {
        let node = NodeInfo {
            kind: NodeKind::Literal(Subtype::String),
            name: "username",
        };
        let parsed = Required.compile(node, &[]).unwrap();
        assert!(parsed.allow_undefineds);
        assert!(!parsed.is_async);

        let stray = vec![Value::from(1)];
        assert!(matches!(
            Required.compile(node, &stray),
            Err(SchemaError::InvalidOptions { .. })
        ));
        assert!(matches!(
            Nullable.compile(node, &stray),
            Err(SchemaError::InvalidOptions { .. })
        ));
    }
}
