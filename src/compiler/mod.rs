//! # Schema Compiler
//!
//! Turns a built schema into a reusable validation procedure: a tree of
//! executable steps mirroring the node tree, with all per-node decisions
//! (bindings, pointers, wildcard forms, loop styles) made once here rather
//! than on every call.
//!
//! # Design Principles
//!
//! - Compile once, execute many: nothing is re-derived per input
//! - One step per node; literals with no rules compile to nothing
//! - Loop styles are chosen here, so sync subtrees never touch a future
//! - The listing records exactly what was emitted, for diagnostics

mod array;
mod literal;
mod object;
mod procedure;

pub use procedure::CompiledProcedure;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::pointer::FieldPath;
use crate::reporter::StepResult;
use crate::runtime::{Access, ExecutionContext, OutSlot};
use crate::schema::{ParsedRule, Schema, SchemaNode};

use array::ArrayStep;
use literal::LiteralStep;
use object::ObjectStep;

/// Compile a schema into its procedure. Infallible: every fallible check
/// already ran while the schema was built.
pub fn compile(schema: &Schema) -> CompiledProcedure {
    let mut assembler = Assembler::new();
    let mut steps = Vec::new();
    for (name, node) in schema.members() {
        let path = FieldPath::root().child(name);
        let compiled = compile_node(
            node,
            name,
            Access::Key(name.clone()),
            path,
            &mut assembler,
            0,
            false,
        );
        if let Some(step) = compiled {
            steps.push((name.clone(), step));
        }
    }
    CompiledProcedure::new(steps, schema.has_async_rules(), assembler.into_listing())
}

/// One executable node of a compiled procedure.
#[derive(Debug)]
pub(crate) enum Step {
    Literal(LiteralStep),
    Object(ObjectStep),
    Array(ArrayStep),
}

impl Step {
    /// Boxed recursion point for the async execution path.
    pub(crate) fn run<'a, 'c: 'a>(
        &'a self,
        tip: &'a Value,
        slot: OutSlot<'a>,
        ctx: &'a mut ExecutionContext<'c>,
    ) -> BoxFuture<'a, StepResult> {
        Box::pin(async move {
            match self {
                Step::Literal(step) => step.run(tip, slot, ctx).await,
                Step::Object(step) => step.run(tip, slot, ctx).await,
                Step::Array(step) => step.run(tip, slot, ctx).await,
            }
        })
    }

    /// Fully synchronous execution, used by sync procedures and by counted
    /// array loops inside async ones.
    pub(crate) fn run_sync(
        &self,
        tip: &Value,
        slot: OutSlot<'_>,
        ctx: &mut ExecutionContext<'_>,
    ) -> StepResult {
        match self {
            Step::Literal(step) => step.run_sync(tip, slot, ctx),
            Step::Object(step) => step.run_sync(tip, slot, ctx),
            Step::Array(step) => step.run_sync(tip, slot, ctx),
        }
    }
}

/// Compile one schema node. Returns `None` for literals with no rules
/// unless `forced`; array elements are forced so every element is copied
/// through validation into the rebuilt output array.
fn compile_node(
    node: &SchemaNode,
    label: &str,
    access: Access,
    path: FieldPath,
    assembler: &mut Assembler,
    depth: usize,
    forced: bool,
) -> Option<Step> {
    if let SchemaNode::Literal { rules, .. } = node {
        if rules.is_empty() && !forced {
            return None;
        }
    }

    let binding = assembler.binding(label);
    assembler.line(depth, describe(&binding, node, label));

    let step = match node {
        SchemaNode::Literal {
            rules, nullable, ..
        } => Step::Literal(LiteralStep::new(access, path, rules.clone(), *nullable)),
        SchemaNode::Object {
            rules,
            children,
            nullable,
            ..
        } => Step::Object(object::compile_object(
            rules,
            children.as_ref(),
            *nullable,
            access,
            path,
            assembler,
            depth,
        )),
        SchemaNode::Array {
            rules,
            each,
            nullable,
            ..
        } => Step::Array(array::compile_array(
            rules,
            each.as_deref(),
            *nullable,
            access,
            path,
            assembler,
            depth,
        )),
    };
    Some(step)
}

fn rule_names(rules: &[ParsedRule]) -> String {
    let names: Vec<&str> = rules.iter().map(|rule| rule.name.as_str()).collect();
    names.join(", ")
}

fn describe(binding: &str, node: &SchemaNode, label: &str) -> String {
    let mut text = format!(
        "{}: {} \"{}\" rules=[{}]",
        binding,
        node.kind().label(),
        label,
        rule_names(node.rules())
    );
    if node.nullable() {
        text.push_str(" nullable");
    }
    match node {
        SchemaNode::Object { children: None, .. } => text.push_str(" members=any"),
        SchemaNode::Array { each: None, .. } => text.push_str(" each=any"),
        SchemaNode::Array {
            each: Some(each), ..
        } => {
            if each.has_async_rules() {
                text.push_str(" each=awaited");
            } else {
                text.push_str(" each=counted");
            }
        }
        _ => {}
    }
    text
}

/// Allocates collision-free binding names and accumulates the listing.
#[derive(Debug, Default)]
struct Assembler {
    counter: usize,
    lines: Vec<String>,
}

impl Assembler {
    fn new() -> Self {
        Self::default()
    }

    /// Next binding for a field label. The label is sanitized and suffixed
    /// with a monotonic counter, so duplicate names in sibling scopes never
    /// collide.
    fn binding(&mut self, label: &str) -> String {
        let base: String = if label == "#" {
            "item".to_string()
        } else {
            label
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect()
        };
        let base = if base.is_empty() {
            "field".to_string()
        } else {
            base
        };
        let binding = format!("{}_{}", base, self.counter);
        self.counter += 1;
        binding
    }

    fn line(&mut self, depth: usize, text: String) {
        self.lines.push(format!("{}{}", "  ".repeat(depth), text));
    }

    fn into_listing(self) -> String {
        self.lines.join("\n")
    }
}
