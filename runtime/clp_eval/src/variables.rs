//! Variable bindings.
//!
//! A scope stack with the global scope at the bottom. Bound values are
//! installed for as long as they stay bound, and so are their names.
//! Local lookups search from the innermost scope outward; global
//! references (`?*x*`) only see the bottom scope.

use std::ops::{Deref, DerefMut};

use clp_ir::{AtomRef, DataValue, SymbolId};
use rustc_hash::FxHashMap;

use crate::environment::OrFatal;
use crate::Environment;

type Scope = FxHashMap<SymbolId, DataValue>;

pub struct Bindings {
    /// Innermost scope last. Never empty.
    scopes: Vec<Scope>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings {
            scopes: vec![Scope::default()],
        }
    }

    pub fn lookup(&self, name: SymbolId, global: bool) -> Option<DataValue> {
        if global {
            return self.scopes.first()?.get(&name).copied();
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    /// Number of scopes, the global scope included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn innermost(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn global(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        &mut self.scopes[0]
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that pops a binding scope on drop.
pub struct ScopedBindings<'env> {
    env: &'env mut Environment,
}

impl Drop for ScopedBindings<'_> {
    fn drop(&mut self) {
        self.env.pop_scope();
    }
}

impl Deref for ScopedBindings<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for ScopedBindings<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Environment {
    /// Bind `name` in the innermost scope, replacing any binding there.
    pub fn bind_variable(&mut self, name: &str, value: DataValue) {
        let symbol = self.intern_symbol(name);
        self.value_install(&value);
        let previous = self.bindings.innermost().insert(symbol, value);
        self.release_binding(symbol, previous);
    }

    /// Bind a global variable.
    pub fn bind_global(&mut self, name: &str, value: DataValue) {
        let symbol = self.intern_symbol(name);
        self.value_install(&value);
        let previous = self.bindings.global().insert(symbol, value);
        self.release_binding(symbol, previous);
    }

    /// Remove `name` from the innermost scope. Returns whether it was bound.
    pub fn unbind_variable(&mut self, name: &str) -> bool {
        let Some(symbol) = self.atoms.lookup_symbol(name) else {
            return false;
        };
        let previous = self.bindings.innermost().remove(&symbol);
        let was_bound = previous.is_some();
        if let Some(value) = previous {
            self.value_deinstall(&value);
            self.atoms.decrement(AtomRef::Symbol(symbol)).or_fatal(self);
        }
        was_bound
    }

    /// Value of a local variable, searching outward.
    pub fn lookup_variable(&self, name: &str) -> Option<DataValue> {
        self.bindings.lookup(self.atoms.lookup_symbol(name)?, false)
    }

    pub fn lookup_global(&self, name: &str) -> Option<DataValue> {
        self.bindings.lookup(self.atoms.lookup_symbol(name)?, true)
    }

    pub fn push_scope(&mut self) {
        self.bindings.scopes.push(Scope::default());
    }

    /// Pop the innermost scope, releasing its bindings. The global scope
    /// is never popped.
    pub fn pop_scope(&mut self) {
        if self.bindings.scopes.len() <= 1 {
            return;
        }
        let Some(scope) = self.bindings.scopes.pop() else {
            return;
        };
        for (symbol, value) in scope {
            self.value_deinstall(&value);
            self.atoms.decrement(AtomRef::Symbol(symbol)).or_fatal(self);
        }
    }

    /// Push a scope that pops when the guard drops.
    pub fn scoped_bindings(&mut self) -> ScopedBindings<'_> {
        self.push_scope();
        ScopedBindings { env: self }
    }

    /// Run `f` inside a fresh binding scope.
    pub fn with_bindings<T>(&mut self, f: impl FnOnce(&mut Environment) -> T) -> T {
        let mut scope = self.scoped_bindings();
        f(&mut scope)
    }

    /// Claim the name of a new binding, or release a replaced value.
    fn release_binding(&mut self, symbol: SymbolId, previous: Option<DataValue>) {
        match previous {
            Some(old) => self.value_deinstall(&old),
            None => self.atoms.increment(AtomRef::Symbol(symbol)).or_fatal(self),
        }
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn inner_scopes_shadow_and_release() {
        let mut env = Environment::new();
        let outer = env.create_integer(1);
        let inner = env.create_integer(2);
        env.bind_variable("x", outer);

        env.with_bindings(|env| {
            env.bind_variable("x", inner);
            assert_eq!(env.lookup_variable("x"), Some(inner));
            assert_eq!(env.atoms().count(inner.atom().expect("atom")).expect("live"), 1);
        });

        assert_eq!(env.lookup_variable("x"), Some(outer));
        assert_eq!(env.atoms().count(inner.atom().expect("atom")).expect("live"), 0);
    }

    #[test]
    fn rebinding_releases_the_old_value() {
        let mut env = Environment::new();
        let first = env.create_string("first");
        let second = env.create_string("second");
        env.bind_variable("s", first);
        env.bind_variable("s", second);
        assert_eq!(env.atoms().count(first.atom().expect("atom")).expect("live"), 0);
        assert_eq!(env.atoms().count(second.atom().expect("atom")).expect("live"), 1);
        assert!(env.unbind_variable("s"));
        assert!(!env.unbind_variable("s"));
        assert_eq!(env.lookup_variable("s"), None);
    }

    #[test]
    fn globals_live_in_the_bottom_scope() {
        let mut env = Environment::new();
        let value = env.create_symbol("on");
        env.bind_global("mode", value);
        env.with_bindings(|env| {
            let local = env.create_symbol("off");
            env.bind_variable("mode", local);
            assert_eq!(env.lookup_global("mode"), Some(value));
            assert_eq!(env.lookup_variable("mode"), Some(local));
        });
        env.pop_scope();
        assert_eq!(env.lookup_global("mode"), Some(value));
    }
}
