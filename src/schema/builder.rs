//! # Schema Builder
//!
//! The fluent front door for declaring schemas. One builder type covers
//! every node kind, so object member lists stay homogeneous. Building runs
//! every referenced rule's compile phase through the registry; all option
//! and shape mistakes surface here, before anything touches input data.

use indexmap::IndexMap;
use serde_json::Value;

use crate::rules::{NodeInfo, RuleRegistry, RuleSpec};

use super::errors::{SchemaError, SchemaResult};
use super::node::{NodeKind, ParsedRule, Schema, SchemaNode, Subtype};

/// A string field.
pub fn string() -> SchemaBuilder {
    SchemaBuilder::new(NodeKind::Literal(Subtype::String), RuleSpec::bare("string"))
}

/// A number field. Numeric strings are coerced.
pub fn number() -> SchemaBuilder {
    SchemaBuilder::new(NodeKind::Literal(Subtype::Number), RuleSpec::bare("number"))
}

/// A boolean field. The usual string and numeric renderings are coerced.
pub fn boolean() -> SchemaBuilder {
    SchemaBuilder::new(
        NodeKind::Literal(Subtype::Boolean),
        RuleSpec::bare("boolean"),
    )
}

/// A `yyyy-mm-dd` date field.
pub fn date() -> SchemaBuilder {
    SchemaBuilder::new(NodeKind::Literal(Subtype::Date), RuleSpec::bare("date"))
}

/// A field restricted to a fixed set of values.
pub fn enumerated(choices: Vec<Value>) -> SchemaBuilder {
    SchemaBuilder::new(
        NodeKind::Literal(Subtype::Enum),
        RuleSpec::new("one_of", vec![Value::Array(choices)]),
    )
}

/// An object field. Without `.members()` any object shape passes through.
pub fn object() -> SchemaBuilder {
    SchemaBuilder::new(NodeKind::Object, RuleSpec::bare("object"))
}

/// An array field. Without `.each()` any element shape passes through.
pub fn array() -> SchemaBuilder {
    SchemaBuilder::new(NodeKind::Array, RuleSpec::bare("array"))
}

/// Declaration of one field, of any kind.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    kind: NodeKind,
    type_spec: RuleSpec,
    specs: Vec<RuleSpec>,
    optional: bool,
    nullable: bool,
    members: Option<Vec<(String, SchemaBuilder)>>,
    element: Option<Box<SchemaBuilder>>,
}

impl SchemaBuilder {
    fn new(kind: NodeKind, type_spec: RuleSpec) -> Self {
        SchemaBuilder {
            kind,
            type_spec,
            specs: Vec::new(),
            optional: false,
            nullable: false,
            members: None,
            element: None,
        }
    }

    /// The field may be missing; a missing field is dropped from the
    /// output.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The field must be defined but may be null; null passes through to
    /// the output.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Append a rule after the presence and type rules.
    pub fn rule(mut self, spec: RuleSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Declare object members, in output order. An empty list produces an
    /// empty object on matching input.
    pub fn members(mut self, members: Vec<(&str, SchemaBuilder)>) -> Self {
        self.members = Some(
            members
                .into_iter()
                .map(|(name, child)| (name.to_string(), child))
                .collect(),
        );
        self
    }

    /// Declare the schema every array element is validated against.
    pub fn each(mut self, element: SchemaBuilder) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    fn build(self, registry: &RuleRegistry, name: &str) -> SchemaResult<SchemaNode> {
        if self.members.is_some() && self.kind != NodeKind::Object {
            return Err(SchemaError::InvalidShape(format!(
                "field '{}' is not an object and cannot have members",
                name
            )));
        }
        if self.element.is_some() && self.kind != NodeKind::Array {
            return Err(SchemaError::InvalidShape(format!(
                "field '{}' is not an array and cannot have an element schema",
                name
            )));
        }

        // Fixed chain order: presence, then type, then user rules.
        let mut specs = Vec::with_capacity(self.specs.len() + 2);
        if !self.optional {
            if self.nullable {
                specs.push(RuleSpec::bare("nullable"));
            } else {
                specs.push(RuleSpec::bare("required"));
            }
        }
        specs.push(self.type_spec);
        specs.extend(self.specs);

        let info = NodeInfo {
            kind: self.kind,
            name,
        };
        let mut rules: Vec<ParsedRule> = Vec::with_capacity(specs.len());
        for spec in &specs {
            let handler = registry.get(&spec.name)?;
            rules.push(handler.compile(info, &spec.options)?);
        }

        match self.kind {
            NodeKind::Literal(subtype) => Ok(SchemaNode::Literal {
                subtype,
                rules,
                optional: self.optional,
                nullable: self.nullable,
            }),
            NodeKind::Object => {
                let children = match self.members {
                    None => None,
                    Some(members) => {
                        let mut built = IndexMap::new();
                        for (child_name, child) in members {
                            let node = child.build(registry, &child_name)?;
                            built.insert(child_name, node);
                        }
                        Some(built)
                    }
                };
                Ok(SchemaNode::Object {
                    rules,
                    children,
                    optional: self.optional,
                    nullable: self.nullable,
                })
            }
            NodeKind::Array => {
                let each = match self.element {
                    None => None,
                    Some(element) => Some(Box::new(element.build(registry, "#")?)),
                };
                Ok(SchemaNode::Array {
                    rules,
                    each,
                    optional: self.optional,
                    nullable: self.nullable,
                })
            }
        }
    }
}

impl Schema {
    /// Build a schema from named field declarations, compiling every rule
    /// through the registry.
    pub fn create(
        registry: &RuleRegistry,
        members: Vec<(&str, SchemaBuilder)>,
    ) -> SchemaResult<Self> {
        let mut built = IndexMap::new();
        for (name, builder) in members {
            let node = builder.build(registry, name)?;
            built.insert(name.to_string(), node);
        }
        Ok(Schema::from_nodes(built))
    }
}
