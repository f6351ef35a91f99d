//! The registry of host-provided functions callable from expressions.

use std::collections::HashMap;

use log::error;

use crate::value::Value;

/// A host callable. Implementations report their own argument-type failures
/// and return [`Value::Unknown`] for them.
pub type NativeFn = Box<dyn Fn(&[Value]) -> Value + Send + Sync>;

struct XtmlFunction {
    callback: NativeFn,
    min_args: usize,
    max_args: usize,
}

#[derive(Default)]
struct Namespace {
    functions: HashMap<String, XtmlFunction>,
}

/// A bundle of functions a host can install into a registry, e.g. the
/// built-in `std` bundle.
pub trait Bundle {
    fn register(&self, registry: &mut FunctionRegistry);
}

/// Maps `namespace::name` to callables with arity bounds. Written once at
/// startup, read during evaluation; the builder threads a shared reference
/// through the evaluators.
#[derive(Default)]
pub struct FunctionRegistry {
    namespaces: HashMap<String, Namespace>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `std` bundle pre-registered.
    pub fn with_std() -> Self {
        let mut registry = Self::new();
        crate::stdlib::StdBundle.register(&mut registry);
        registry
    }

    /// Create a namespace. Re-registering an existing namespace keeps its
    /// functions.
    pub fn register_namespace(&mut self, name: &str) {
        self.namespaces.entry(name.to_owned()).or_default();
    }

    /// Register a function under an existing namespace, overwriting any
    /// previous mapping for the name. Returns `false` when the namespace
    /// does not exist. An arity pair of `(0, 0)` means "any number of
    /// arguments"; otherwise `max_args == 0` leaves the count unbounded
    /// above.
    pub fn register_function(
        &mut self,
        namespace: &str,
        name: &str,
        callback: NativeFn,
        min_args: usize,
        max_args: usize,
    ) -> bool {
        let Some(ns) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        ns.functions.insert(
            name.to_owned(),
            XtmlFunction {
                callback,
                min_args,
                max_args,
            },
        );
        true
    }

    pub fn exists(&self, namespace: &str, name: &str) -> bool {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.functions.contains_key(name))
            .unwrap_or(false)
    }

    /// Invoke a registered function. Arity violations and missing functions
    /// are reported and yield [`Value::Unknown`].
    pub fn call(&self, namespace: &str, name: &str, args: &[Value]) -> Value {
        let Some(function) = self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.functions.get(name))
        else {
            error!("function {namespace}::{name} not found");
            return Value::Unknown;
        };

        let any_arity = function.min_args == 0 && function.max_args == 0;
        let in_bounds = args.len() >= function.min_args
            && (function.max_args == 0 || args.len() <= function.max_args);
        if !(any_arity || in_bounds) {
            error!(
                "function {namespace}::{name} called with {count} arguments, expected {min}..{max}",
                count = args.len(),
                min = function.min_args,
                max = function.max_args,
            );
            return Value::Unknown;
        }

        (function.callback)(args)
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut namespaces = f.debug_map();
        for (name, ns) in &self.namespaces {
            let mut functions = ns.functions.keys().collect::<Vec<_>>();
            functions.sort();
            namespaces.entry(name, &functions);
        }
        namespaces.finish()
    }
}
