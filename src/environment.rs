use crate::value::Value;
use log::trace;
use std::collections::HashMap;

/// Index of a scope inside an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

/// Arena of chained scopes. Scope 0 is the global scope and is never
/// popped; block scopes are pushed and popped in strict LIFO order, so a
/// parent always outlives its children.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The innermost scope, where declarations land.
    pub fn current(&self) -> ScopeId {
        ScopeId(self.scopes.len() - 1)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) -> ScopeId {
        let enclosing = self.current();
        self.scopes.push(Scope {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        });
        trace!("pushed scope {}", self.scopes.len() - 1);
        self.current()
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            trace!("popped scope {}", self.scopes.len());
        }
    }

    /// Binds `name` in the current scope, replacing any binding in that scope.
    pub fn define(&mut self, name: &str, value: Value) {
        let current = self.current();
        self.scopes[current.0].values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self.current());
        while let Some(ScopeId(index)) = scope {
            if let Some(value) = self.scopes[index].values.get(name) {
                return Some(value);
            }
            scope = self.scopes[index].enclosing;
        }
        None
    }

    /// Overwrites the innermost existing binding. Returns `false` when
    /// `name` is not bound anywhere; nothing is declared in that case.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        let mut scope = Some(self.current());
        while let Some(ScopeId(index)) = scope {
            if let Some(slot) = self.scopes[index].values.get_mut(name) {
                *slot = value;
                return true;
            }
            scope = self.scopes[index].enclosing;
        }
        false
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
