//! The variable environment threaded through evaluation.

use std::collections::HashMap;

use crate::value::Value;

/// A flat mapping from identifier to [`Value`]. The DSL has no nested
/// lexical scoping: every node mutates the single environment passed down,
/// and partially updated state stays observable after a failed evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Copy all bindings from `other` into this environment, overwriting
    /// existing keys.
    pub fn merge(&mut self, other: &Environment) {
        for (key, value) in &other.vars {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// A detached copy, used for `resolve="local"` includes.
    pub fn snapshot(&self) -> Environment {
        self.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Whether `name` is a valid variable identifier: a letter or underscore
/// followed by letters, digits, or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
