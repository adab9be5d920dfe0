//! # Schema Tree
//!
//! The data model every compiled procedure is built from. A schema is an
//! ordered tree of nodes; every node carries the rules that run against its
//! field, pre-compiled into `ParsedRule`s at build time so procedures and
//! validation calls share one immutable description.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Scalar flavor of a literal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

/// Node kind, exposed to rule compilation for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Literal(Subtype),
    Object,
    Array,
}

impl NodeKind {
    /// Human label used in configuration errors.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Literal(Subtype::String) => "string",
            NodeKind::Literal(Subtype::Number) => "number",
            NodeKind::Literal(Subtype::Boolean) => "boolean",
            NodeKind::Literal(Subtype::Date) => "date",
            NodeKind::Literal(Subtype::Enum) => "enum",
            NodeKind::Object => "object",
            NodeKind::Array => "array",
        }
    }
}

/// One rule, compiled at schema-build time.
///
/// The options are type-erased: each rule downcasts to the options type its
/// own compile phase produced, which lets a rule carry pre-built state such
/// as a compiled regex. Shared read-only across every compiled procedure
/// and every validation call.
#[derive(Clone)]
pub struct ParsedRule {
    pub name: String,
    options: Arc<dyn Any + Send + Sync>,
    pub is_async: bool,
    pub allow_undefineds: bool,
}

impl ParsedRule {
    pub fn new(name: impl Into<String>, options: impl Any + Send + Sync) -> Self {
        ParsedRule {
            name: name.into(),
            options: Arc::new(options),
            is_async: false,
            allow_undefineds: false,
        }
    }

    /// Mark the rule as suspending; its async validate hook is awaited in
    /// place and the enclosing loops switch to the awaited form.
    pub fn with_async(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Run the rule even when the field does not exist.
    pub fn with_allow_undefineds(mut self) -> Self {
        self.allow_undefineds = true;
        self
    }

    /// Downcast the compiled options.
    pub fn options<T: Any>(&self) -> Option<&T> {
        self.options.downcast_ref::<T>()
    }
}

impl fmt::Debug for ParsedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedRule")
            .field("name", &self.name)
            .field("is_async", &self.is_async)
            .field("allow_undefineds", &self.allow_undefineds)
            .finish()
    }
}

/// One element of the schema tree.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Literal {
        subtype: Subtype,
        rules: Vec<ParsedRule>,
        optional: bool,
        nullable: bool,
    },
    Object {
        rules: Vec<ParsedRule>,
        /// `None` accepts any object shape without recursing. An empty map
        /// recurses into nothing and outputs an empty object.
        children: Option<IndexMap<String, SchemaNode>>,
        optional: bool,
        nullable: bool,
    },
    Array {
        rules: Vec<ParsedRule>,
        /// `None` accepts any element shape.
        each: Option<Box<SchemaNode>>,
        optional: bool,
        nullable: bool,
    },
}

impl SchemaNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Literal { subtype, .. } => NodeKind::Literal(*subtype),
            SchemaNode::Object { .. } => NodeKind::Object,
            SchemaNode::Array { .. } => NodeKind::Array,
        }
    }

    pub fn rules(&self) -> &[ParsedRule] {
        match self {
            SchemaNode::Literal { rules, .. }
            | SchemaNode::Object { rules, .. }
            | SchemaNode::Array { rules, .. } => rules,
        }
    }

    pub fn optional(&self) -> bool {
        match self {
            SchemaNode::Literal { optional, .. }
            | SchemaNode::Object { optional, .. }
            | SchemaNode::Array { optional, .. } => *optional,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            SchemaNode::Literal { nullable, .. }
            | SchemaNode::Object { nullable, .. }
            | SchemaNode::Array { nullable, .. } => *nullable,
        }
    }

    /// True when any rule in this subtree suspends. Drives the loop-style
    /// selection for enclosing arrays and the procedure's async flag.
    pub fn has_async_rules(&self) -> bool {
        if self.rules().iter().any(|rule| rule.is_async) {
            return true;
        }
        match self {
            SchemaNode::Literal { .. } => false,
            SchemaNode::Object { children, .. } => children
                .as_ref()
                .map(|members| members.values().any(SchemaNode::has_async_rules))
                .unwrap_or(false),
            SchemaNode::Array { each, .. } => each
                .as_ref()
                .map(|node| node.has_async_rules())
                .unwrap_or(false),
        }
    }
}

/// Immutable root of a built schema: named members in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    members: IndexMap<String, SchemaNode>,
}

impl Schema {
    /// Assemble a schema directly from nodes. The fluent builder is the
    /// usual front door; this is for hand-assembled trees.
    pub fn from_nodes(members: IndexMap<String, SchemaNode>) -> Self {
        Schema { members }
    }

    pub fn members(&self) -> &IndexMap<String, SchemaNode> {
        &self.members
    }

    pub fn has_async_rules(&self) -> bool {
        self.members.values().any(SchemaNode::has_async_rules)
    }
}
