//! # Literal Step
//!
//! The compiled form of a scalar field, and the evaluation core embedded by
//! the object and array steps for their own rule chains. Reads the field
//! from the tip container, scopes the execution context to its pointer,
//! runs the rule chain against one mutable cell, and writes the final value
//! to the output slot.

use serde_json::Value;

use crate::pointer::FieldPath;
use crate::reporter::{Halt, StepResult};
use crate::runtime::{Access, ExecutionContext, FieldCell, OutSlot};
use crate::schema::ParsedRule;

#[derive(Debug)]
pub(crate) struct LiteralStep {
    access: Access,
    path: FieldPath,
    wildcard: Option<String>,
    rules: Vec<ParsedRule>,
    nullable: bool,
}

impl LiteralStep {
    pub(crate) fn new(
        access: Access,
        path: FieldPath,
        rules: Vec<ParsedRule>,
        nullable: bool,
    ) -> Self {
        let wildcard = path.wildcard();
        LiteralStep {
            access,
            path,
            wildcard,
            rules,
            nullable,
        }
    }

    pub(crate) fn nullable(&self) -> bool {
        self.nullable
    }

    /// Read the field and point the context at it. The pointer renders from
    /// the live index stack, so the same step reports `users.0.name` and
    /// `users.1.name` on consecutive elements.
    fn prepare<'v>(&self, tip: &'v Value, ctx: &mut ExecutionContext<'_>) -> FieldCell<'v> {
        let value = ctx.read(tip, &self.access);
        let pointer = self.path.render(ctx.indices());
        let field = match &self.access {
            Access::Key(key) => key.clone(),
            Access::Element => ctx
                .indices()
                .last()
                .map(|index| index.to_string())
                .unwrap_or_default(),
        };
        ctx.enter_field(pointer, field, self.wildcard.clone());
        FieldCell::new(value, ctx.support())
    }

    /// Run the rule chain and hand back the cell, for embedding steps that
    /// decide themselves what to do with the value.
    pub(crate) fn evaluate_sync<'v>(
        &self,
        tip: &'v Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<FieldCell<'v>, Halt> {
        let mut cell = self.prepare(tip, ctx);
        for rule in &self.rules {
            if !rule.allow_undefineds && !cell.exists() {
                continue;
            }
            let handler = ctx.handler(rule)?;
            handler.validate(&mut cell, rule, tip, ctx)?;
        }
        Ok(cell)
    }

    /// Async variant: async rules are awaited in place, sync rules run
    /// inline, chain order is preserved either way.
    pub(crate) async fn evaluate<'v>(
        &self,
        tip: &'v Value,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<FieldCell<'v>, Halt> {
        let mut cell = self.prepare(tip, ctx);
        for rule in &self.rules {
            if !rule.allow_undefineds && !cell.exists() {
                continue;
            }
            let handler = ctx.handler(rule)?;
            if rule.is_async {
                handler.validate_async(&mut cell, rule, tip, ctx).await?;
            } else {
                handler.validate(&mut cell, rule, tip, ctx)?;
            }
        }
        Ok(cell)
    }

    pub(crate) fn run_sync(
        &self,
        tip: &Value,
        slot: OutSlot<'_>,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let cell = self.evaluate_sync(tip, ctx)?;
        self.commit(cell, slot);
        Ok(())
    }

    pub(crate) async fn run(
        &self,
        tip: &Value,
        slot: OutSlot<'_>,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        let cell = self.evaluate(tip, ctx).await?;
        self.commit(cell, slot);
        Ok(())
    }

    /// Output protocol: existing values are written as the chain left them;
    /// a nullable field holding an explicit null is written as null; absent
    /// fields are dropped.
    fn commit(&self, cell: FieldCell<'_>, slot: OutSlot<'_>) {
        if cell.exists() {
            if let Some(value) = cell.into_value() {
                slot.assign(value);
            }
        } else if self.nullable && cell.is_null() {
            slot.assign(Value::Null);
        }
    }
}
