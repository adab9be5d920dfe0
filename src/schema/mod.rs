//! # Schema Subsystem
//!
//! Everything that exists before the first input arrives: the node tree,
//! the fluent builder, and the build-time error type. A built schema is
//! immutable and fully compiled at the rule level; the procedure compiler
//! consumes it without ever re-checking configuration.
//!
//! # Design Principles
//!
//! - All fallible work happens at build time
//! - Rule chains have a fixed order: presence, type, user rules
//! - Built schemas are shared freely across threads and procedures

mod builder;
mod errors;
mod node;

pub use builder::{array, boolean, date, enumerated, number, object, string, SchemaBuilder};
pub use errors::{SchemaError, SchemaResult};
pub use node::{NodeKind, ParsedRule, Schema, SchemaNode, Subtype};
