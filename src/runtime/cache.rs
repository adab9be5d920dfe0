//! # Procedure Cache
//!
//! Keyed storage for compiled procedures, so hot validation paths skip
//! recompilation. Keys are caller-chosen strings; the cache never inspects
//! the schema to build one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::compiler::{compile, CompiledProcedure};
use crate::schema::{Schema, SchemaError, SchemaResult};

#[derive(Debug, Default)]
pub struct ProcedureCache {
    procedures: RwLock<HashMap<String, Arc<CompiledProcedure>>>,
}

impl ProcedureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached procedure for a key, compiling on first sight. The key alone
    /// identifies the entry: a caller reusing a key with a different schema
    /// gets whatever was compiled first.
    pub fn get_or_compile(
        &self,
        key: &str,
        schema: &Schema,
    ) -> SchemaResult<Arc<CompiledProcedure>> {
        {
            let procedures = self
                .procedures
                .read()
                .map_err(|_| SchemaError::Internal("Lock poisoned".into()))?;
            if let Some(found) = procedures.get(key) {
                return Ok(Arc::clone(found));
            }
        }

        // Compile outside the lock; on a concurrent miss the first insert wins.
        let compiled = Arc::new(compile(schema));
        let mut procedures = self
            .procedures
            .write()
            .map_err(|_| SchemaError::Internal("Lock poisoned".into()))?;
        let entry = procedures.entry(key.to_string()).or_insert(compiled);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.procedures.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
