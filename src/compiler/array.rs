//! # Array Step
//!
//! Compiled form of an array node. The element subtree is compiled once and
//! reused for every index; the loop style is fixed here from a recursive
//! async scan, so arrays whose elements never suspend iterate without
//! touching a future even inside an async execution.

use serde_json::Value;

use crate::pointer::FieldPath;
use crate::reporter::StepResult;
use crate::runtime::{Access, ExecutionContext, OutSlot};
use crate::schema::{ParsedRule, SchemaNode};

use super::literal::LiteralStep;
use super::{compile_node, Assembler, Step};

/// How the element loop advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopStyle {
    /// No async rules anywhere below: a plain counted loop.
    Counted,
    /// Each element step is awaited before the index advances.
    Awaited,
}

#[derive(Debug)]
pub(crate) struct ArrayStep {
    literal: LiteralStep,
    /// `None` accepts any element shape and passes the array through.
    each: Option<(LoopStyle, Box<Step>)>,
}

pub(super) fn compile_array(
    rules: &[ParsedRule],
    each: Option<&SchemaNode>,
    nullable: bool,
    access: Access,
    path: FieldPath,
    assembler: &mut Assembler,
    depth: usize,
) -> ArrayStep {
    let each = each.and_then(|node| {
        let style = if node.has_async_rules() {
            LoopStyle::Awaited
        } else {
            LoopStyle::Counted
        };
        let step = compile_node(
            node,
            "#",
            Access::Element,
            path.element(),
            assembler,
            depth + 1,
            true,
        )?;
        Some((style, Box::new(step)))
    });
    ArrayStep {
        literal: LiteralStep::new(access, path, rules.to_vec(), nullable),
        each,
    }
}

impl ArrayStep {
    pub(crate) fn run_sync(
        &self,
        tip: &Value,
        slot: OutSlot<'_>,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let cell = self.literal.evaluate_sync(tip, ctx)?;
        if !cell.exists() {
            if self.literal.nullable() && cell.is_null() {
                slot.assign(Value::Null);
            }
            return Ok(());
        }
        let (_, step) = match &self.each {
            None => {
                if let Some(value) = cell.into_value() {
                    if value.is_array() {
                        slot.assign(value);
                    }
                }
                return Ok(());
            }
            Some(each) => each,
        };
        let (tip_value, length) = match cell.value() {
            Some(value @ Value::Array(items)) => (value, items.len()),
            _ => return Ok(()),
        };
        let mut items = Vec::with_capacity(length);
        for index in 0..length {
            let mut element = Value::Null;
            ctx.push_index(index);
            let outcome = step.run_sync(tip_value, OutSlot::Element(&mut element), ctx);
            ctx.pop_index();
            outcome?;
            items.push(element);
        }
        slot.assign(Value::Array(items));
        Ok(())
    }

    pub(crate) async fn run(
        &self,
        tip: &Value,
        slot: OutSlot<'_>,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let cell = self.literal.evaluate(tip, ctx).await?;
        if !cell.exists() {
            if self.literal.nullable() && cell.is_null() {
                slot.assign(Value::Null);
            }
            return Ok(());
        }
        let (style, step) = match &self.each {
            None => {
                if let Some(value) = cell.into_value() {
                    if value.is_array() {
                        slot.assign(value);
                    }
                }
                return Ok(());
            }
            Some(each) => each,
        };
        let (tip_value, length) = match cell.value() {
            Some(value @ Value::Array(items)) => (value, items.len()),
            _ => return Ok(()),
        };
        let mut items = Vec::with_capacity(length);
        for index in 0..length {
            let mut element = Value::Null;
            ctx.push_index(index);
            let outcome = match style {
                LoopStyle::Counted => {
                    step.run_sync(tip_value, OutSlot::Element(&mut element), ctx)
                }
                LoopStyle::Awaited => {
                    step.run(tip_value, OutSlot::Element(&mut element), ctx).await
                }
            };
            ctx.pop_index();
            outcome?;
            items.push(element);
        }
        slot.assign(Value::Array(items));
        Ok(())
    }
}
