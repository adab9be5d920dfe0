//! # Custom Messages
//!
//! Failure message overrides, keyed by `pointer.rule`, `wildcard.rule`, or
//! the bare rule name, checked in that order. The stored string is used
//! verbatim; there is no templating.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message override bag, one per validate call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages {
    overrides: HashMap<String, String>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.overrides.insert(key.into(), message.into());
    }

    /// Builder form of `insert`.
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.insert(key, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Resolve the override for one failure, most specific key first.
    pub fn resolve(&self, pointer: &str, wildcard: Option<&str>, rule: &str) -> Option<&str> {
        if let Some(found) = self.overrides.get(&format!("{}.{}", pointer, rule)) {
            return Some(found.as_str());
        }
        if let Some(wildcard) = wildcard {
            if let Some(found) = self.overrides.get(&format!("{}.{}", wildcard, rule)) {
                return Some(found.as_str());
            }
        }
        self.overrides.get(rule).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pointer_wins_over_wildcard() {
        let messages = Messages::new()
            .with("users.0.name.required", "first user needs a name")
            .with("users.*.name.required", "every user needs a name");

        let found = messages.resolve("users.0.name", Some("users.*.name"), "required");
        assert_eq!(found, Some("first user needs a name"));

        let found = messages.resolve("users.3.name", Some("users.*.name"), "required");
        assert_eq!(found, Some("every user needs a name"));
    }

    #[test]
    fn test_bare_rule_is_the_last_resort() {
        let messages = Messages::new().with("required", "this one is mandatory");

        assert_eq!(
            messages.resolve("title", None, "required"),
            Some("this one is mandatory")
        );
        assert_eq!(messages.resolve("title", None, "string"), None);
    }

    #[test]
    fn test_empty_bag_resolves_nothing() {
        let messages = Messages::new();
        assert!(messages.is_empty());
        assert_eq!(messages.resolve("a.b", Some("a.*"), "required"), None);
    }
}
