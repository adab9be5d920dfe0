//! # Validation Entry Point
//!
//! The front door for callers: owns the registry handle and the procedure
//! cache, builds the per-call runtime state, and picks the default
//! reporter. Everything here is explicit values; there is no global
//! validator and no global registry.

use std::sync::Arc;

use serde_json::Value;

use crate::compiler::{compile, CompiledProcedure};
use crate::errors::ValidateError;
use crate::messages::Messages;
use crate::reporter::{ErrorReporter, ListReporter};
use crate::rules::RuleRegistry;
use crate::runtime::cache::ProcedureCache;
use crate::runtime::{Refs, RuntimeSupport};
use crate::schema::Schema;

/// One validation call, built fluently around a schema and its input.
pub struct ValidateRequest<'a> {
    schema: &'a Schema,
    data: &'a Value,
    bail: bool,
    exists_strict: bool,
    cache_key: Option<String>,
    refs: Refs,
    messages: Messages,
    reporter: Option<Box<dyn ErrorReporter>>,
}

impl<'a> ValidateRequest<'a> {
    pub fn new(schema: &'a Schema, data: &'a Value) -> Self {
        ValidateRequest {
            schema,
            data,
            bail: false,
            exists_strict: false,
            cache_key: None,
            refs: Refs::new(),
            messages: Messages::new(),
            reporter: None,
        }
    }

    /// Stop at the first failure instead of collecting all of them.
    pub fn with_bail(mut self) -> Self {
        self.bail = true;
        self
    }

    /// Treat empty strings as non-existent for presence checks.
    pub fn with_strict_existence(mut self) -> Self {
        self.exists_strict = true;
        self
    }

    /// Reuse the compiled procedure across calls under this key.
    pub fn with_cache_key(mut self, key: &str) -> Self {
        self.cache_key = Some(key.to_string());
        self
    }

    /// Provide a value for rules that resolve refs at validate time.
    pub fn with_ref(mut self, key: &str, value: Value) -> Self {
        self.refs.insert(key.to_string(), value);
        self
    }

    /// Custom failure messages for the default reporter.
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Replace the default reporter. A custom reporter carries its own
    /// messages and bail choice; the request's are ignored.
    pub fn with_reporter(mut self, reporter: Box<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }
}

/// A reusable validation service around one rule registry.
pub struct Validator {
    registry: Arc<RuleRegistry>,
    cache: ProcedureCache,
}

impl Validator {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Validator {
            registry,
            cache: ProcedureCache::new(),
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ProcedureCache {
        &self.cache
    }

    fn procedure(
        &self,
        request: &ValidateRequest<'_>,
    ) -> Result<Arc<CompiledProcedure>, ValidateError> {
        match &request.cache_key {
            Some(key) => Ok(self.cache.get_or_compile(key, request.schema)?),
            None => Ok(Arc::new(compile(request.schema))),
        }
    }

    /// Validate one input, awaiting async rules in place. Returns the
    /// sanitized output on success.
    pub async fn validate(&self, request: ValidateRequest<'_>) -> Result<Value, ValidateError> {
        let procedure = self.procedure(&request)?;
        let support = Self::support(&request);
        let ValidateRequest {
            data,
            bail,
            refs,
            messages,
            reporter,
            ..
        } = request;
        match reporter {
            Some(mut reporter) => {
                procedure
                    .execute(data, &self.registry, &mut *reporter, support, &refs)
                    .await
            }
            None => {
                let mut reporter = ListReporter::new(messages, bail);
                procedure
                    .execute(data, &self.registry, &mut reporter, support, &refs)
                    .await
            }
        }
    }

    /// Synchronous validation; fails fast if the schema has async rules.
    pub fn validate_sync(&self, request: ValidateRequest<'_>) -> Result<Value, ValidateError> {
        let procedure = self.procedure(&request)?;
        let support = Self::support(&request);
        let ValidateRequest {
            data,
            bail,
            refs,
            messages,
            reporter,
            ..
        } = request;
        match reporter {
            Some(mut reporter) => {
                procedure.execute_sync(data, &self.registry, &mut *reporter, support, &refs)
            }
            None => {
                let mut reporter = ListReporter::new(messages, bail);
                procedure.execute_sync(data, &self.registry, &mut reporter, support, &refs)
            }
        }
    }

    fn support(request: &ValidateRequest<'_>) -> RuntimeSupport {
        if request.exists_strict {
            RuntimeSupport::strict()
        } else {
            RuntimeSupport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::schema::string;

    use super::*;

    #[test]
    fn test_cache_key_reuses_the_compiled_procedure() {
        let validator = Validator::new(Arc::new(RuleRegistry::standard()));
        let schema = Schema::create(validator.registry(), vec![("name", string())]).unwrap();
        let data = json!({ "name": "ada" });

        for _ in 0..3 {
            let request = ValidateRequest::new(&schema, &data).with_cache_key("people");
            validator.validate_sync(request).unwrap();
        }
        assert_eq!(validator.cache().len(), 1);
    }

    #[test]
    fn test_no_cache_key_compiles_fresh() {
        let validator = Validator::new(Arc::new(RuleRegistry::standard()));
        let schema = Schema::create(validator.registry(), vec![("name", string())]).unwrap();
        let data = json!({ "name": "ada" });

        validator
            .validate_sync(ValidateRequest::new(&schema, &data))
            .unwrap();
        assert!(validator.cache().is_empty());
    }
}
