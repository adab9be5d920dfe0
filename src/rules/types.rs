//! # Type Rules
//!
//! One rule per node subtype plus the container shape rules. Type rules own
//! the coercion step: a value that can be converted is mutated in place so
//! every later rule and the output see the converted form.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::reporter::StepResult;
use crate::runtime::{ExecutionContext, FieldCell};
use crate::schema::{ParsedRule, SchemaError, SchemaResult};

use super::{expect_options, no_options, NodeInfo, Rule};

/// Value must already be a string. No coercion.
pub struct StringType;

impl Rule for StringType {
    fn name(&self) -> &'static str {
        "string"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        match cell.value() {
            Some(Value::String(_)) => Ok(()),
            _ => ctx.fail(rule, "string validation failed", None),
        }
    }
}

/// Value must be a number; numeric strings are coerced, whole numbers
/// before floats so `"20"` stays an integer.
pub struct NumberType;

fn coerce_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(whole) = text.parse::<i64>() {
        return Some(Value::from(whole));
    }
    text.parse::<f64>()
        .ok()
        .filter(|real| real.is_finite())
        .map(Value::from)
}

impl Rule for NumberType {
    fn name(&self) -> &'static str {
        "number"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let coerced = match cell.value() {
            Some(Value::Number(_)) => return Ok(()),
            Some(Value::String(text)) => coerce_number(text),
            _ => None,
        };
        match coerced {
            Some(number) => {
                cell.mutate(number);
                Ok(())
            }
            None => ctx.fail(rule, "number validation failed", None),
        }
    }
}

/// Value must be a boolean; `"true"`, `"false"`, `"1"`, `"0"`, `1` and `0`
/// are coerced.
pub struct BooleanType;

impl Rule for BooleanType {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let coerced = match cell.value() {
            Some(Value::Bool(_)) => return Ok(()),
            Some(Value::String(text)) => match text.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Some(Value::Number(number)) => match number.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        };
        match coerced {
            Some(flag) => {
                cell.mutate(Value::Bool(flag));
                Ok(())
            }
            None => ctx.fail(rule, "boolean validation failed", None),
        }
    }
}

/// Value must be a `yyyy-mm-dd` date string. Mutates to the normalized
/// rendering so downstream comparisons see one canonical form.
pub struct DateType;

impl Rule for DateType {
    fn name(&self) -> &'static str {
        "date"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let normalized = match cell.value() {
            Some(Value::String(text)) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| Value::from(date.format("%Y-%m-%d").to_string())),
            _ => None,
        };
        match normalized {
            Some(date) => {
                cell.mutate(date);
                Ok(())
            }
            None => ctx.fail(rule, "date validation failed", None),
        }
    }
}

/// Shape rule for object nodes. Reports on anything that is not a JSON
/// object; recursion into children is the node's own business.
pub struct ObjectShape;

impl Rule for ObjectShape {
    fn name(&self) -> &'static str {
        "object"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        match cell.value() {
            Some(value) if ctx.support().is_object_shaped(value) => Ok(()),
            _ => ctx.fail(rule, "object validation failed", None),
        }
    }
}

/// Shape rule for array nodes.
pub struct ArrayShape;

impl Rule for ArrayShape {
    fn name(&self) -> &'static str {
        "array"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        no_options(self.name(), options)?;
        Ok(ParsedRule::new(self.name(), ()))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        match cell.value() {
            Some(Value::Array(_)) => Ok(()),
            _ => ctx.fail(rule, "array validation failed", None),
        }
    }
}

/// Compiled choice list for `one_of`.
#[derive(Debug)]
pub struct OneOfOptions {
    pub choices: Vec<Value>,
}

/// Value must equal one of the compiled choices. The choices ride along in
/// the failure args so reporters can show what was allowed.
pub struct OneOf;

impl Rule for OneOf {
    fn name(&self) -> &'static str {
        "one_of"
    }

    fn compile(&self, _node: NodeInfo<'_>, options: &[Value]) -> SchemaResult<ParsedRule> {
        let choices = match options {
            [Value::Array(choices)] if !choices.is_empty() => choices.clone(),
            _ => {
                return Err(SchemaError::InvalidOptions {
                    rule: self.name().to_string(),
                    reason: "expected one non-empty array of choices".to_string(),
                })
            }
        };
        Ok(ParsedRule::new(self.name(), OneOfOptions { choices }))
    }

    fn validate(
        &self,
        cell: &mut FieldCell<'_>,
        rule: &ParsedRule,
        _tip: &Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let options = expect_options::<OneOfOptions>(rule, ctx)?;
        let matched = cell
            .value()
            .map(|value| options.choices.contains(value))
            .unwrap_or(false);
        if matched {
            Ok(())
        } else {
            let args = json!({ "choices": options.choices });
            ctx.fail(rule, "one_of validation failed", Some(args))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{NodeKind, Subtype};

    use super::*;

    fn enum_node() -> NodeInfo<'static> {
        NodeInfo {
            kind: NodeKind::Literal(Subtype::Enum),
            name: "role",
        }
    }

    #[test]
    fn test_number_coercion_prefers_whole_numbers() {
        assert_eq!(coerce_number("20"), Some(Value::from(20i64)));
        assert_eq!(coerce_number("  7 "), Some(Value::from(7i64)));
        assert_eq!(coerce_number("2.5"), Some(Value::from(2.5)));
        assert_eq!(coerce_number("abc"), None);
        assert_eq!(coerce_number("NaN"), None);
        assert_eq!(coerce_number("inf"), None);
    }

    #[test]
    fn test_one_of_compiles_its_choices() {
        let options = vec![json!(["admin", "member"])];
        let parsed = OneOf.compile(enum_node(), &options).unwrap();
        let compiled = parsed.options::<OneOfOptions>().unwrap();
        assert_eq!(compiled.choices, vec![json!("admin"), json!("member")]);
    }

    #[test]
    fn test_one_of_rejects_bad_options() {
        for options in [vec![], vec![json!("admin")], vec![json!([])]] {
            assert!(matches!(
                OneOf.compile(enum_node(), &options),
                Err(SchemaError::InvalidOptions { .. })
            ));
        }
    }
}
