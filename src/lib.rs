//! sift - Compile-once schema validation and coercion for untyped JSON
//!
//! Declare a schema, compile it into a reusable procedure, run it against
//! any number of inputs. Valid calls yield a sanitized output value with
//! coercions applied; invalid calls yield every failure the reporter chose
//! to collect.

pub mod compiler;
pub mod errors;
pub mod messages;
pub mod pointer;
pub mod reporter;
pub mod rules;
pub mod runtime;
pub mod schema;
pub mod validator;

pub use compiler::{compile, CompiledProcedure};
pub use errors::ValidateError;
pub use messages::Messages;
pub use reporter::{ErrorReporter, FlatReporter, ListReporter, ValidationError};
pub use rules::{async_trait, Rule, RuleRegistry, RuleSpec};
pub use schema::{Schema, SchemaBuilder, SchemaError};
pub use validator::{ValidateRequest, Validator};
