//! # Object Step
//!
//! Compiled form of an object node: a literal phase for the node's own rule
//! chain, then recursion into compiled children against a fresh output map.
//! Only declared children reach the output; unknown input keys are dropped
//! by construction.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::pointer::FieldPath;
use crate::reporter::StepResult;
use crate::runtime::{Access, ExecutionContext, OutSlot};
use crate::schema::{ParsedRule, SchemaNode};

use super::literal::LiteralStep;
use super::{compile_node, Assembler, Step};

#[derive(Debug)]
pub(crate) struct ObjectStep {
    literal: LiteralStep,
    /// `None` accepts any object shape and passes the value through.
    children: Option<Vec<(String, Step)>>,
}

pub(super) fn compile_object(
    rules: &[ParsedRule],
    children: Option<&IndexMap<String, SchemaNode>>,
    nullable: bool,
    access: Access,
    path: FieldPath,
    assembler: &mut Assembler,
    depth: usize,
) -> ObjectStep {
    let children = children.map(|members| {
        let mut compiled = Vec::new();
        for (name, node) in members {
            let child = compile_node(
                node,
                name,
                Access::Key(name.clone()),
                path.child(name),
                assembler,
                depth + 1,
                false,
            );
            if let Some(step) = child {
                compiled.push((name.clone(), step));
            }
        }
        compiled
    });
    ObjectStep {
        literal: LiteralStep::new(access, path, rules.to_vec(), nullable),
        children,
    }
}

impl ObjectStep {
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
        let children = match &self.children {
            None => {
                if let Some(value) = cell.into_value() {
                    if ctx.support().is_object_shaped(&value) {
                        slot.assign(value);
                    }
                }
                return Ok(());
            }
            Some(children) => children,
        };
        let tip_value = match cell.value() {
            Some(value) if ctx.support().is_object_shaped(value) => value,
            _ => return Ok(()),
        };
        let mut fields = Map::new();
        for (name, step) in children {
            let child_slot = OutSlot::Field {
                out: &mut fields,
                key: name,
            };
            step.run_sync(tip_value, child_slot, ctx)?;
        }
        slot.assign(Value::Object(fields));
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
        let children = match &self.children {
            None => {
                if let Some(value) = cell.into_value() {
                    if ctx.support().is_object_shaped(&value) {
                        slot.assign(value);
                    }
                }
                return Ok(());
            }
            Some(children) => children,
        };
        let tip_value = match cell.value() {
            Some(value) if ctx.support().is_object_shaped(value) => value,
            _ => return Ok(()),
        };
        let mut fields = Map::new();
        for (name, step) in children {
            let child_slot = OutSlot::Field {
                out: &mut fields,
                key: name,
            };
            step.run(tip_value, child_slot, ctx).await?;
        }
        slot.assign(Value::Object(fields));
        Ok(())
    }
}
