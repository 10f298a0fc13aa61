//! Variable environment
//!
//! A stack of lexical scopes tracking variable bindings during one round of
//! evaluation. The environment is created fresh at round start and discarded
//! at round end; values that must survive across rounds live in the export
//! maps keyed by alignment path, never here.

use indexmap::IndexMap;

use fieldcast_foundation::{Reference, Value};

use crate::error::{Error, Result};

/// Nested lexical scopes, innermost last.
///
/// The base scope is always present: [`Environment::pop`] can remove every
/// scope pushed during evaluation but never the base itself.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<IndexMap<Reference, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment holding only the base scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![IndexMap::new()],
        }
    }

    /// Enter a new nested scope.
    pub fn push(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Exit the innermost scope.
    pub fn pop(&mut self) -> Result<()> {
        if self.scopes.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Current nesting depth, base scope included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `var` to `value`.
    ///
    /// With `can_shadow` the binding lands in the innermost scope, hiding
    /// (not destroying) any outer binding of the same name. Without it, the
    /// nearest enclosing binding is overwritten in place, or a fresh
    /// innermost binding is created when none exists — this is what lets
    /// loop-carried state variables persist across scope boundaries.
    ///
    /// Returns the value displaced at the affected binding; a shadow over an
    /// outer binding displaces nothing.
    pub fn put(&mut self, var: Reference, value: Value, can_shadow: bool) -> Option<Value> {
        if !can_shadow {
            for scope in self.scopes.iter_mut().rev() {
                if let Some(slot) = scope.get_mut(&var) {
                    return Some(std::mem::replace(slot, value));
                }
            }
        }
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(var, value),
            None => None,
        }
    }

    /// Bind every pair into the current scope with shadow semantics.
    ///
    /// Used for function-call argument binding: argument names must always
    /// shadow, never retroactively overwrite a caller's variable of the same
    /// name.
    pub fn put_all<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (Reference, Value)>,
    {
        for (var, value) in bindings {
            self.put(var, value, true);
        }
    }

    /// Look up `var`, innermost scope first.
    ///
    /// Absence is not an error; the caller decides whether to default or
    /// fail.
    pub fn get(&self, var: &Reference) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(var))
    }
}
